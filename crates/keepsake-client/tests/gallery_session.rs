use keepsake_client::lightbox::Key;
use keepsake_client::prefs::HIDDEN_DEFAULTS_KEY;
use keepsake_client::{
    Card, ClientErrorCode, GalleryApi, GallerySession, HiddenDefaults, KeyOutcome, KvStore,
    LocalGalleryApi, MemoryKvStore, UploadFile, UploadOptions,
};
use keepsake_model::{ItemPatch, Tag};
use std::sync::Arc;

fn defaults() -> Vec<Card> {
    vec![
        Card::builtin("images/beach.jpg", "Beach", "Our first trip", Tag::new(Tag::NATURE)),
        Card::builtin("images/tokyo.jpg", "Tokyo", "Neon nights", Tag::new(Tag::CITY)),
        Card::builtin("images/swirl.jpg", "Swirl", "Daydream", Tag::new(Tag::ABSTRACT)),
    ]
}

fn session() -> (Arc<MemoryKvStore>, Arc<LocalGalleryApi>, GallerySession) {
    let kv = Arc::new(MemoryKvStore::default());
    let api = Arc::new(LocalGalleryApi::new(kv.clone()));
    let session = GallerySession::new(api.clone(), kv.clone(), defaults());
    (kv, api, session)
}

#[tokio::test]
async fn load_hides_deleted_defaults_and_puts_persisted_items_first() {
    let (kv, api, mut session) = session();
    HiddenDefaults::new(kv.as_ref())
        .add("images/tokyo.jpg")
        .expect("hide");
    api.upload(
        vec![UploadFile::new("kiss.webp", vec![7])],
        &UploadOptions::default(),
    )
    .await
    .expect("seed upload");

    session.load().await.expect("load");
    let srcs: Vec<&str> = session.cards().iter().map(|c| c.src.as_str()).collect();
    assert_eq!(srcs.len(), 3);
    assert!(srcs[0].starts_with("data:image/webp;base64,"));
    assert_eq!(&srcs[1..], ["images/beach.jpg", "images/swirl.jpg"]);
}

#[tokio::test]
async fn upload_lands_on_top_with_prompted_tag() {
    let (_kv, _api, mut session) = session();
    session.load().await.expect("load");
    let created = session
        .upload(
            vec![
                UploadFile::new("first.jpg", vec![1]),
                UploadFile::new("second.png", vec![2]),
            ],
            &UploadOptions::tagged(keepsake_client::category::tag_for_answer("2")),
        )
        .await
        .expect("upload");
    assert_eq!(created.len(), 2);
    assert_eq!(session.cards().len(), 5);
    assert_eq!(session.cards()[0].alt, "second");
    assert_eq!(session.cards()[1].alt, "first");
    assert!(session.cards()[..2].iter().all(|c| c.tag.as_str() == "city"));
}

#[tokio::test]
async fn deleting_a_builtin_card_hides_it_for_later_sessions() {
    let (kv, api, mut session) = session();
    session.load().await.expect("load");
    let removed = session.delete(0).await.expect("delete");
    assert_eq!(removed.src, "images/beach.jpg");
    assert!(kv
        .get(HIDDEN_DEFAULTS_KEY)
        .expect("get")
        .is_some_and(|raw| raw.contains("images/beach.jpg")));

    let mut next = GallerySession::new(api, kv, defaults());
    next.load().await.expect("load");
    assert_eq!(next.cards().len(), 2);
}

#[tokio::test]
async fn captions_are_editable_only_on_persisted_cards() {
    let (_kv, api, mut session) = session();
    session.load().await.expect("load");
    let builtin_index = session.cards().len() - 1;
    let err = session
        .edit_caption(builtin_index, "nope")
        .await
        .expect_err("builtin");
    assert_eq!(err.code, ClientErrorCode::Invalid);

    session
        .upload(vec![UploadFile::new("us.jpg", vec![3])], &UploadOptions::default())
        .await
        .expect("upload");
    let edited = session
        .edit_caption(0, "  Best day  ")
        .await
        .expect("edit");
    assert_eq!(edited.caption_text, "Best day");
    assert_eq!(api.list().await.expect("list")[0].caption_text, "Best day");
}

#[tokio::test]
async fn deleting_a_persisted_card_removes_it_from_the_store() {
    let (_kv, api, mut session) = session();
    session.load().await.expect("load");
    session
        .upload(vec![UploadFile::new("gone.gif", vec![4])], &UploadOptions::default())
        .await
        .expect("upload");
    session.delete(0).await.expect("delete");
    assert!(api.list().await.expect("list").is_empty());
    assert_eq!(session.cards().len(), 3);
}

#[tokio::test]
async fn refresh_picks_up_writes_from_another_session() {
    let (_kv, api, mut session) = session();
    session.load().await.expect("load");

    let created = api
        .upload(vec![UploadFile::new("other-tab.jpg", vec![5])], &UploadOptions::default())
        .await
        .expect("upload elsewhere");
    api.update(&created[0].id, &ItemPatch::caption("from the other tab"))
        .await
        .expect("update elsewhere");
    assert_eq!(session.cards().len(), 3);

    session.refresh().await.expect("refresh");
    assert_eq!(session.cards().len(), 4);
    assert_eq!(session.cards()[0].caption_text, "from the other tab");
}

#[tokio::test]
async fn filter_and_lightbox_work_over_the_card_list() {
    let (_kv, _api, mut session) = session();
    session.load().await.expect("load");

    session.set_filter("city");
    let visible = session.visible_cards();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].0, 1);
    session.set_filter("all");
    assert_eq!(session.visible_cards().len(), 3);

    session.open_lightbox(2).expect("open");
    assert_eq!(session.handle_key(&Key::ArrowRight), KeyOutcome::Showing(0));
    assert_eq!(
        session.lightbox().current().map(|i| i.caption_text.as_str()),
        Some("Our first trip")
    );
    assert_eq!(
        session.handle_key(&Key::Escape),
        KeyOutcome::Closed {
            restore_focus: Some("card:2".to_string())
        }
    );
}

#[tokio::test]
async fn empty_gallery_cannot_open_the_lightbox() {
    let kv = Arc::new(MemoryKvStore::default());
    let api = Arc::new(LocalGalleryApi::new(kv.clone()));
    let mut session = GallerySession::new(api, kv, Vec::new());
    session.load().await.expect("load");
    let err = session.open_lightbox(0).expect_err("empty");
    assert_eq!(err.code, ClientErrorCode::Invalid);
}
