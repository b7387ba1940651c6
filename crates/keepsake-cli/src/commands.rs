// SPDX-License-Identifier: Apache-2.0

use crate::output::{emit_ok, render_grid};
use crate::{CliError, OutputMode};
use keepsake_client::category::{category_choices, prompt_text, tag_for_answer};
use keepsake_client::grid::matches_filter;
use keepsake_client::{
    FileKvStore, FilterLabels, GalleryApi, GridLayout, HttpGalleryApi, LocalGalleryApi,
    ThemePreference, UploadFile, UploadOptions,
};
use keepsake_model::{ItemPatch, Tag};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

const LOCAL_ITEMS_FILE: &str = "gallery.json";

pub(crate) struct Context {
    pub server: String,
    pub local: Option<PathBuf>,
    pub state: PathBuf,
    pub output_mode: OutputMode,
}

impl Context {
    fn api(&self) -> Box<dyn GalleryApi> {
        match &self.local {
            Some(dir) => {
                debug!(dir = %dir.display(), "using local gallery");
                let kv = Arc::new(FileKvStore::new(dir.join(LOCAL_ITEMS_FILE)));
                Box::new(LocalGalleryApi::new(kv))
            }
            None => {
                debug!(server = %self.server, "using gallery server");
                Box::new(HttpGalleryApi::new(&self.server))
            }
        }
    }

    fn prefs(&self) -> FileKvStore {
        FileKvStore::new(&self.state)
    }
}

pub(crate) struct UploadArgs {
    pub tag: Option<String>,
    pub choice: Option<String>,
    pub caption: Option<String>,
    pub alt: Option<String>,
}

pub(crate) async fn list(ctx: &Context, filter: &str, columns: u8) -> Result<(), CliError> {
    let grid = GridLayout::new(columns)?;
    let items: Vec<_> = ctx
        .api()
        .list()
        .await?
        .into_iter()
        .filter(|item| matches_filter(filter, item.tag.as_str()))
        .collect();
    if ctx.output_mode.json {
        return emit_ok(ctx.output_mode, json!({"items": items}));
    }
    println!("{}", render_grid(&grid, &items));
    Ok(())
}

pub(crate) async fn upload(
    ctx: &Context,
    paths: Vec<PathBuf>,
    args: UploadArgs,
) -> Result<(), CliError> {
    let tag = match (args.tag, args.choice) {
        (Some(tag), _) => Tag::or_default(Some(&tag)),
        (None, Some(answer)) => tag_for_answer(&answer),
        (None, None) => Tag::default(),
    };
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        files.push(UploadFile::from_path(path).await?);
    }
    let options = UploadOptions {
        tag,
        caption_text: args.caption,
        alt: args.alt,
    };
    let created = ctx.api().upload(files, &options).await?;
    emit_ok(
        ctx.output_mode,
        json!({
            "submitted": paths.len(),
            "created": created.len(),
            "items": created,
        }),
    )
}

pub(crate) async fn update(
    ctx: &Context,
    id: &str,
    caption: Option<String>,
    tag: Option<String>,
    alt: Option<String>,
) -> Result<(), CliError> {
    let patch = ItemPatch {
        caption_text: caption,
        tag,
        alt,
    };
    if patch.is_empty() {
        return Err(CliError::usage(
            "nothing to update; pass --caption, --tag or --alt",
        ));
    }
    let item = ctx.api().update(id, &patch).await?;
    emit_ok(ctx.output_mode, json!({ "item": item }))
}

pub(crate) async fn delete(ctx: &Context, id: &str) -> Result<(), CliError> {
    ctx.api().delete(id).await?;
    emit_ok(ctx.output_mode, json!({ "deleted": id }))
}

pub(crate) fn theme(ctx: &Context, toggle: bool) -> Result<(), CliError> {
    let kv = ctx.prefs();
    let theme = ThemePreference::new(&kv);
    let mode = if toggle { theme.toggle()? } else { theme.load()? };
    emit_ok(ctx.output_mode, json!({ "theme": mode.as_str() }))
}

pub(crate) fn labels(ctx: &Context, tag: Option<&str>, label: Option<&str>) -> Result<(), CliError> {
    let kv = ctx.prefs();
    let labels = FilterLabels::new(&kv);
    match (tag, label) {
        (Some(tag), Some(label)) => {
            let stored = labels.set(tag, label.trim())?;
            emit_ok(ctx.output_mode, json!({ "tag": tag, "label": stored }))
        }
        (Some(tag), None) => {
            let label = labels.label(tag)?;
            emit_ok(ctx.output_mode, json!({ "tag": tag, "label": label }))
        }
        _ => emit_ok(ctx.output_mode, json!({ "labels": labels.load()? })),
    }
}

pub(crate) fn categories(ctx: &Context) -> Result<(), CliError> {
    let kv = ctx.prefs();
    let choices = category_choices(&FilterLabels::new(&kv))?;
    if ctx.output_mode.json {
        let rows: Vec<_> = choices
            .iter()
            .map(|c| json!({"number": c.number, "tag": c.tag, "label": c.label}))
            .collect();
        return emit_ok(ctx.output_mode, json!({ "choices": rows }));
    }
    println!("{}", prompt_text(&choices));
    Ok(())
}
