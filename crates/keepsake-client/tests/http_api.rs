use keepsake_client::{
    ClientErrorCode, GalleryApi, GallerySession, HttpGalleryApi, MemoryKvStore, UploadFile,
    UploadOptions,
};
use keepsake_model::{ItemPatch, Tag};
use keepsake_server::{build_router, AppState, ServerConfig};
use std::sync::Arc;

async fn spawn_server(root: &std::path::Path) -> String {
    let cfg = ServerConfig {
        data_root: root.to_path_buf(),
        ..ServerConfig::default()
    };
    let state = AppState::new(cfg).expect("app state");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, build_router(state))
            .await
            .expect("serve");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn upload_list_update_delete_round_trip() {
    let root = tempfile::tempdir().expect("tempdir");
    let api = HttpGalleryApi::new(&spawn_server(root.path()).await);

    let created = api
        .upload(
            vec![
                UploadFile::new("photo.PNG", b"png-bytes".to_vec()),
                UploadFile::new("readme.md", b"no".to_vec()),
            ],
            &UploadOptions::tagged(Tag::new(Tag::CITY)),
        )
        .await
        .expect("upload");
    assert_eq!(created.len(), 1);
    let item = &created[0];
    assert_eq!(item.tag.as_str(), "city");
    assert_eq!(item.alt, "photo");
    assert_eq!(item.caption_text, "New memory — photo");
    assert!(item.src.ends_with(".png"));

    let listed = api.list().await.expect("list");
    assert_eq!(listed, created);

    let image = reqwest::get(api.resolve_src(&item.src))
        .await
        .expect("fetch image")
        .bytes()
        .await
        .expect("image bytes");
    assert_eq!(image.as_ref(), b"png-bytes");

    let updated = api
        .update(
            &item.id,
            &ItemPatch {
                tag: Some("abstract".to_string()),
                ..ItemPatch::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.tag.as_str(), "abstract");
    assert_eq!(updated.caption_text, item.caption_text);

    api.delete(&item.id).await.expect("delete");
    assert!(api.list().await.expect("list").is_empty());

    let err = api.delete(&item.id).await.expect_err("second delete");
    assert_eq!(err.code, ClientErrorCode::NotFound);
    let err = api
        .update(&item.id, &ItemPatch::caption("late"))
        .await
        .expect_err("update after delete");
    assert_eq!(err.code, ClientErrorCode::NotFound);
}

#[tokio::test]
async fn empty_upload_and_unreachable_server_are_reported() {
    let root = tempfile::tempdir().expect("tempdir");
    let api = HttpGalleryApi::new(&spawn_server(root.path()).await);
    let err = api
        .upload(Vec::new(), &UploadOptions::default())
        .await
        .expect_err("no files");
    assert_eq!(err.code, ClientErrorCode::Rejected);

    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let dead = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);
    let err = HttpGalleryApi::new(&dead)
        .list()
        .await
        .expect_err("unreachable");
    assert_eq!(err.code, ClientErrorCode::Network);
}

#[tokio::test]
async fn two_sessions_converge_after_refresh() {
    let root = tempfile::tempdir().expect("tempdir");
    let base = spawn_server(root.path()).await;
    let api: Arc<dyn GalleryApi> = Arc::new(HttpGalleryApi::new(&base));

    let mut first = GallerySession::new(api.clone(), Arc::new(MemoryKvStore::default()), Vec::new());
    let mut second =
        GallerySession::new(api.clone(), Arc::new(MemoryKvStore::default()), Vec::new());
    first.load().await.expect("load first");
    second.load().await.expect("load second");

    first
        .upload(
            vec![UploadFile::new("shared.jpg", b"jpg".to_vec())],
            &UploadOptions::default(),
        )
        .await
        .expect("upload");
    first.edit_caption(0, "Seen by both").await.expect("edit");
    assert!(second.cards().is_empty());

    second.refresh().await.expect("refresh");
    assert_eq!(second.cards().len(), 1);
    assert_eq!(second.cards()[0].caption_text, "Seen by both");
}
