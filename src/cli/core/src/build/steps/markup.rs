/* src/cli/core/src/build/steps/markup.rs */

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::build::context::TargetContext;
use crate::build::fs::{blocking, has_extension, list_files, write_file};
use crate::define::substitute_markup;
use crate::env::EnvironmentMap;

fn comment_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").unwrap())
}

fn between_tags_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r">\s+<").unwrap())
}

/// Strip comments and whitespace between tags. Text content is left alone.
pub(crate) fn minify_html(html: &str) -> String {
  let stripped = comment_re().replace_all(html, "");
  between_tags_re().replace_all(&stripped, "><").trim().to_string()
}

fn render_pages(src: &Path, dest: &Path, env: &EnvironmentMap, minify: bool) -> Result<()> {
  for (path, rel) in list_files(src, |p| has_extension(p, "html"))? {
    let html = std::fs::read_to_string(&path)
      .with_context(|| format!("failed to read {}", path.display()))?;
    let mut page = substitute_markup(&html, env).with_context(|| format!("in {}", path.display()))?;
    if minify {
      page = minify_html(&page);
    }
    write_file(&dest.join(rel), &page)?;
  }
  Ok(())
}

pub(crate) async fn run(ctx: &TargetContext) -> Result<()> {
  let src = ctx.session.path(&ctx.session.config.source.pages_dir);
  let dest = ctx.out_dir.clone();
  let env = ctx.env.clone();
  let minify = !ctx.mode.is_dev;
  blocking(move || render_pages(&src, &dest, &env, minify)).await
}
