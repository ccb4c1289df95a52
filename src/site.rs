//! Static site generation.

use std::collections::{HashSet, VecDeque};
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context as _;
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use url::Url;

use crate::cli::BuildArgs;
use crate::config::{DataFiles, SiteConfig};
use crate::detail::{self, DetailItem, ModalState, PageState};
use crate::formats::{
    BiographyData, BooksData, IndexData, MaterialsData, MeetingsData, Place, PlacesData,
};
use crate::html::{error_block, escape_attr, unescape_attr, wrap_document};
use crate::listing;
use crate::markdown::{self, LinkMode};
use crate::place::PlaceView;
use crate::source::{FsSource, HttpSource, MarkdownSource, content_key};

const DATA_MISSING: &str = "Не удалось загрузить данные";

/// Linked documents rendered for the modal (bare HTML).
const FRAGMENTS_DIR: &str = "fragments";
/// Linked documents rendered as standalone pages in plain link mode.
const DOCS_DIR: &str = "docs";

static MODAL_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-md="([^"]*)""#).expect("valid modal target regex"));
static MARKDOWN_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a href="([^"]*)" class="markdown-link""#).expect("valid markdown href regex")
});
static URL_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\s)(href|src)="([^"]*)""#).expect("valid url attribute regex"));

pub async fn run(args: BuildArgs) -> anyhow::Result<()> {
    let data_dir = PathBuf::from(&args.data);
    if !data_dir.is_dir() {
        anyhow::bail!("data directory not found: {}", data_dir.display());
    }

    let out_dir = PathBuf::from(&args.out);
    if out_dir.exists() && !args.force {
        anyhow::bail!("site output directory already exists: {}", out_dir.display());
    }

    let mut config = SiteConfig::load(args.config.as_deref().map(Path::new))?;
    config.apply_env();
    if let Some(mode) = args.link_mode {
        config.link_mode = mode;
    }

    let source: Box<dyn MarkdownSource> = match args.markdown_base.as_deref() {
        Some(base) => {
            let base = Url::parse(base).with_context(|| format!("parse markdown base: {base}"))?;
            Box::new(HttpSource::new(base)?)
        }
        None => Box::new(FsSource::new(&data_dir)),
    };

    let data = SiteData::load(&data_dir, &config.files);

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("create site dir: {}", out_dir.display()))?;
    let report = build_site(&data, &config, source.as_ref(), &out_dir, args.force).await?;

    tracing::info!(
        out = %out_dir.display(),
        pages = report.pages,
        fragments = report.fragments,
        link_mode = ?config.link_mode,
        "site built"
    );
    Ok(())
}

/// Every data file of the site; `None` when the file is missing or unreadable.
#[derive(Debug, Default)]
pub struct SiteData {
    pub biography: Option<BiographyData>,
    pub meetings: Option<MeetingsData>,
    pub books: Option<BooksData>,
    pub places: Option<PlacesData>,
    pub index: Option<IndexData>,
    pub materials: Option<MaterialsData>,
}

impl SiteData {
    pub fn load(data_dir: &Path, files: &DataFiles) -> Self {
        Self {
            biography: read_data(data_dir, &files.biography),
            meetings: read_data(data_dir, &files.meetings),
            books: read_data(data_dir, &files.books),
            places: read_data(data_dir, &files.places),
            index: read_data(data_dir, &files.index),
            materials: read_data(data_dir, &files.materials),
        }
    }

    /// Places from `biography.json` followed by `places.json` entries with new ids.
    pub fn all_places(&self) -> Vec<&Place> {
        let mut seen = HashSet::new();
        let from_biography = self.biography.iter().flat_map(|b| b.places.iter());
        let from_places = self.places.iter().flat_map(|p| p.places.iter());
        from_biography
            .chain(from_places)
            .filter(|place| seen.insert(place.id.clone()))
            .collect()
    }
}

/// Read one data file. Failures only affect the pages built from it.
fn read_data<T: DeserializeOwned>(data_dir: &Path, rel: &str) -> Option<T> {
    let path = data_dir.join(rel);
    if !path.exists() {
        tracing::warn!(path = %path.display(), "data file not found; skipping");
        return None;
    }
    let parsed = std::fs::read_to_string(&path)
        .with_context(|| format!("read data file: {}", path.display()))
        .and_then(|json| {
            serde_json::from_str(&json)
                .with_context(|| format!("parse data file: {}", path.display()))
        });
    match parsed {
        Ok(data) => Some(data),
        Err(err) => {
            tracing::warn!(path = %path.display(), ?err, "unusable data file; skipping");
            None
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    pub pages: usize,
    /// Linked Markdown documents written under `fragments/` or `docs/`.
    pub fragments: usize,
}

struct SiteWriter<'a> {
    out_dir: &'a Path,
    title: &'a str,
    link_mode: LinkMode,
    force: bool,
    report: BuildReport,
    linked_docs: VecDeque<String>,
}

impl SiteWriter<'_> {
    fn page(&mut self, rel: &str, page_title: &str, body: &str) -> anyhow::Result<()> {
        self.write_page(rel, page_title, body)?;
        self.report.pages += 1;
        Ok(())
    }

    /// `body` uses URLs relative to the site root; they are rebased onto the
    /// page's directory before writing.
    fn write_page(&mut self, rel: &str, page_title: &str, body: &str) -> anyhow::Result<()> {
        let root = "../".repeat(rel.matches('/').count());
        let (body, linked) = link_site_paths(body, &root, self.link_mode);
        self.linked_docs.extend(linked);
        let html = wrap_document(self.title, page_title, &root, &body);
        write_file(&self.out_dir.join(rel), &html, self.force)
    }

    fn list_page<T: ?Sized>(
        &mut self,
        rel: &str,
        page_title: &str,
        data: Option<&T>,
        body: impl FnOnce(&T) -> String,
    ) -> anyhow::Result<()> {
        let body = match data {
            Some(data) => body(data),
            None => error_block(DATA_MISSING),
        };
        let body = format!("<h1 class=\"page-title\">{page_title}</h1>\n{body}");
        self.page(rel, page_title, &body)
    }

    /// Render every Markdown document reachable from the written pages.
    ///
    /// Linked documents are scanned as well, so documents linked from other
    /// linked documents are rendered too. Each document is fetched once.
    async fn linked_documents(&mut self, source: &dyn MarkdownSource) -> anyhow::Result<()> {
        let mut seen = HashSet::new();

        while let Some(target) = self.linked_docs.pop_front() {
            let key = match content_key(&target) {
                Ok(key) => key,
                Err(err) => {
                    tracing::warn!(target = %target, ?err, "linked document outside the content root; skipping");
                    continue;
                }
            };
            if !seen.insert(key.clone()) {
                continue;
            }

            let body = match detail::load_fragment(source, &key, self.link_mode).await {
                ModalState::Loaded { html, .. } => html,
                ModalState::Error { message, .. } => error_block(&message),
                ModalState::Closed | ModalState::Loading { .. } => continue,
            };

            match self.link_mode {
                LinkMode::ModalAware => {
                    self.linked_docs.extend(modal_targets(&body));
                    let path = self.out_dir.join(FRAGMENTS_DIR).join(format!("{key}.html"));
                    write_file(&path, &body, self.force)?;
                }
                LinkMode::Plain => {
                    self.write_page(&format!("{DOCS_DIR}/{key}.html"), &key, &body)?;
                }
            }
            self.report.fragments += 1;
        }

        Ok(())
    }
}

/// Write all pages and modal fragments into `out_dir`.
pub async fn build_site(
    data: &SiteData,
    config: &SiteConfig,
    source: &dyn MarkdownSource,
    out_dir: &Path,
    force: bool,
) -> anyhow::Result<BuildReport> {
    let link_mode = config.link_mode;
    let mut writer = SiteWriter {
        out_dir,
        title: &config.title,
        link_mode,
        force,
        report: BuildReport::default(),
        linked_docs: VecDeque::new(),
    };

    let seminars = data
        .index
        .as_ref()
        .map(|index| index.meetings.as_slice())
        .or_else(|| data.meetings.as_ref().map(|m| m.meetings.as_slice()));
    writer.list_page("index.html", "Семинары", seminars, listing::seminars)?;

    let people = data.biography.as_ref().map(|b| b.people.as_slice());
    writer.list_page("biography.html", "Персоналии", people, listing::person_grid)?;

    let biographies = match &data.biography {
        Some(biography) => {
            Some(listing::biographies(&biography.people, &biography.places, source, link_mode).await)
        }
        None => None,
    };
    writer.list_page("biographies.html", "Биографии", biographies.as_ref(), |html| html.clone())?;

    let meetings = data.meetings.as_ref();
    writer.list_page("meetings.html", "Встречи", meetings, |m| {
        listing::meeting_grid(&m.materials)
    })?;
    writer.list_page("meetings-table.html", "Таблица встреч", meetings, |m| {
        listing::meetings_table(&m.meetings)
    })?;
    writer.list_page("materials.html", "Материалы", data.materials.as_ref(), |m| {
        listing::materials(&m.materials)
    })?;

    writer.page("404.html", detail::NOT_FOUND_MESSAGE, &detail::render_not_found())?;

    let people = people.unwrap_or_default();
    let place_views: Vec<PlaceView<'_>> = data
        .all_places()
        .into_iter()
        .map(|place| PlaceView::new(place, people))
        .collect();

    let mut items: Vec<&dyn DetailItem> = Vec::new();
    if let Some(biography) = &data.biography {
        items.extend(biography.people.iter().map(|p| p as &dyn DetailItem));
    }
    if let Some(meetings) = &data.meetings {
        items.extend(meetings.materials.iter().map(|m| m as &dyn DetailItem));
    }
    if let Some(books) = &data.books {
        items.extend(books.books.iter().map(|b| b as &dyn DetailItem));
    }
    items.extend(place_views.iter().map(|v| v as &dyn DetailItem));

    let mut written = HashSet::new();
    for item in &items {
        let kind = item.kind();
        let Some(file_name) = page_file_name(item.id().as_str()) else {
            tracing::warn!(kind = kind.dir_name(), id = %item.id(), "unusable item id; skipping page");
            continue;
        };
        let rel = format!("{}/{file_name}", kind.dir_name());
        if !written.insert(rel.clone()) {
            tracing::warn!(page = %rel, "duplicate item id; keeping the first record");
            continue;
        }

        let state = PageState::load(*item, source, link_mode).await;
        writer.page(&rel, &state.page_title, &detail::render_static_page(&state))?;
    }

    writer.linked_documents(source).await?;

    Ok(writer.report)
}

/// `data-md` targets of modal-trigger anchors in `html`.
pub fn modal_targets(html: &str) -> Vec<String> {
    MODAL_TARGET
        .captures_iter(html)
        .map(|caps| unescape_attr(&caps[1]))
        .collect()
}

/// Rebase site-relative `href`/`src` URLs in `body` onto `root`.
///
/// Returns the markup and the Markdown documents it links to. In plain mode
/// `.md` links are pointed at their rendered page under `docs/`.
pub fn link_site_paths(body: &str, root: &str, link_mode: LinkMode) -> (String, Vec<String>) {
    let mut linked = modal_targets(body);

    let body = match link_mode {
        LinkMode::ModalAware => body.to_owned(),
        LinkMode::Plain => MARKDOWN_HREF
            .replace_all(body, |caps: &Captures<'_>| {
                let href = unescape_attr(&caps[1]);
                match docs_href(&href) {
                    Some(doc) => {
                        linked.push(href);
                        format!(r#"<a href="{}" class="markdown-link""#, escape_attr(&doc))
                    }
                    None => caps[0].to_owned(),
                }
            })
            .into_owned(),
    };

    let body = URL_ATTR
        .replace_all(&body, |caps: &Captures<'_>| {
            let url = unescape_attr(&caps[3]);
            if is_site_relative(&url) {
                format!(r#"{}{}="{}""#, &caps[1], &caps[2], escape_attr(&format!("{root}{url}")))
            } else {
                caps[0].to_owned()
            }
        })
        .into_owned();

    (body, linked)
}

/// Site-root path of the page rendered for a linked Markdown document.
fn docs_href(href: &str) -> Option<String> {
    if !is_site_relative(href) || !markdown::is_markdown_target(href) {
        return None;
    }
    let key = content_key(href).ok()?;
    let anchor = href.find('#').map(|i| &href[i..]).unwrap_or_default();
    Some(format!("{DOCS_DIR}/{key}.html{anchor}"))
}

/// Relative to the current directory: no scheme, no leading `/`, `#` or `?`.
fn is_site_relative(url: &str) -> bool {
    !url.is_empty()
        && !url.starts_with(['#', '/', '?'])
        && matches!(Url::parse(url), Err(url::ParseError::RelativeUrlWithoutBase))
}

/// `<id>.html`, or `None` when the id cannot be used as a file name.
pub fn page_file_name(id: &str) -> Option<String> {
    let id = id.trim();
    if id.is_empty() || id.starts_with('.') || id.contains(['/', '\\']) {
        return None;
    }
    Some(format!("{id}.html"))
}

fn write_file(path: &Path, contents: &str, force: bool) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir: {}", parent.display()))?;
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("open output: {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("write output: {}", path.display()))?;
    file.flush()
        .with_context(|| format!("flush output: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::tests::CountingSource;
    use crate::formats::{Meeting, Person, Scalar};

    fn person(id: &str, bio: &str) -> Person {
        Person {
            id: Scalar::new(id),
            full_name: Some(format!("Person {id}")),
            biography_text: Some(bio.to_owned()),
            ..Person::default()
        }
    }

    #[test]
    fn modal_targets_are_unescaped() {
        let html = r##"<a href="#" class="markdown-link modal-trigger" data-md="a&amp;b.md">x</a> <a data-md="c.md">y</a>"##;
        assert_eq!(modal_targets(html), vec!["a&b.md", "c.md"]);
    }

    #[test]
    fn site_relative_urls_follow_the_page_directory() {
        let body = concat!(
            r#"<img class="detail-image" src="img/a.jpg" alt="">"#,
            r#"<a href="person/a.html" class="person-card-link">a</a>"#,
            r#"<a href="https://example.com/x" class="markdown-link">x</a>"#,
            r##"<a href="#" class="markdown-link modal-trigger" data-md="notes/n.md">n</a>"##,
            r##"<a href="#early" class="toc-link">e</a>"##,
        );
        let (html, linked) = link_site_paths(body, "../", LinkMode::ModalAware);
        assert!(html.contains(r#"src="../img/a.jpg""#));
        assert!(html.contains(r#"href="../person/a.html""#));
        assert!(html.contains(r#"href="https://example.com/x""#));
        assert!(html.contains(r##"href="#" class="markdown-link modal-trigger" data-md="notes/n.md""##));
        assert!(html.contains(r##"href="#early""##));
        assert_eq!(linked, vec!["notes/n.md"]);
    }

    #[test]
    fn plain_markdown_links_point_at_rendered_docs() {
        let body = concat!(
            r#"<a href="notes/./n.md#part" class="markdown-link">n</a>"#,
            r#"<a href="files/a.pdf" class="markdown-link">pdf</a>"#,
            r#"<a href="../outside.md" class="markdown-link">out</a>"#,
        );
        let (html, linked) = link_site_paths(body, "../", LinkMode::Plain);
        assert!(html.contains(r#"href="../docs/notes/n.md.html#part""#));
        assert!(html.contains(r#"href="../files/a.pdf""#));
        assert_eq!(linked, vec!["notes/./n.md#part"]);
    }

    #[test]
    fn unreadable_data_file_only_drops_that_file() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let data_dir = temp.path().join("data");
        std::fs::create_dir_all(&data_dir)?;
        std::fs::write(data_dir.join("books.json"), "{ not json")?;
        std::fs::write(
            data_dir.join("biography.json"),
            r#"{"people":[{"id":"a","full_name":"A"}],"places":[]}"#,
        )?;

        let data = SiteData::load(temp.path(), &DataFiles::default());
        assert!(data.books.is_none());
        assert_eq!(data.biography.map(|b| b.people.len()), Some(1));
        Ok(())
    }

    #[test]
    fn page_file_names() {
        assert_eq!(page_file_name("gagarin").as_deref(), Some("gagarin.html"));
        assert_eq!(page_file_name("12").as_deref(), Some("12.html"));
        assert_eq!(page_file_name("../x"), None);
        assert_eq!(page_file_name("a/b"), None);
        assert_eq!(page_file_name(" "), None);
    }

    #[test]
    fn places_are_merged_by_id() {
        let place = |id: &str, name: &str| Place {
            id: Scalar::new(id),
            name: Some(name.to_owned()),
            ..Place::default()
        };
        let data = SiteData {
            biography: Some(BiographyData {
                people: Vec::new(),
                places: vec![place("a", "from biography")],
            }),
            places: Some(PlacesData {
                places: vec![place("a", "from places"), place("b", "only places")],
            }),
            ..SiteData::default()
        };
        let names: Vec<&str> = data
            .all_places()
            .into_iter()
            .filter_map(|p| p.name.as_deref())
            .collect();
        assert_eq!(names, vec!["from biography", "only places"]);
    }

    #[tokio::test]
    async fn builds_pages_and_linked_fragments() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let out = temp.path().join("site");
        let source = CountingSource::with(&[
            ("bio/a.md", "# Жизнь\nСм. [заметку](notes/n.md).\n"),
            ("notes/n.md", "Заметка со ссылкой на [другую](./notes/m.md)."),
            ("notes/m.md", "Последняя."),
        ]);
        let data = SiteData {
            biography: Some(BiographyData {
                people: vec![person("a", "bio/a.md"), person("../evil", "")],
                places: Vec::new(),
            }),
            meetings: Some(MeetingsData {
                materials: vec![Meeting {
                    id: Scalar::new("m1"),
                    title: Some("Встреча".to_owned()),
                    notes: Some("notes/missing.md".to_owned()),
                    ..Meeting::default()
                }],
                meetings: Vec::new(),
            }),
            ..SiteData::default()
        };

        let report = build_site(&data, &SiteConfig::default(), &source, &out, false).await?;

        let person = std::fs::read_to_string(out.join("person").join("a.html"))?;
        assert!(person.contains("<title>Person a - Биография</title>"));
        assert!(person.contains("data-root=\"../\""));
        assert!(person.contains("data-md=\"notes/n.md\""));
        assert!(!out.join("person").join("..").join("evil.html").exists());

        let meeting = std::fs::read_to_string(out.join("meeting").join("m1.html"))?;
        assert!(meeting.contains(detail::CONTENT_LOAD_ERROR));

        let fragment = std::fs::read_to_string(out.join("fragments").join("notes").join("n.md.html"))?;
        assert!(fragment.contains("data-md=\"./notes/m.md\""));
        assert!(out.join("fragments").join("notes").join("m.md.html").exists());
        assert_eq!(report.fragments, 2);
        assert_eq!(source.fetches("notes/n.md"), 1);

        let materials = std::fs::read_to_string(out.join("materials.html"))?;
        assert!(materials.contains(DATA_MISSING));
        assert!(out.join("404.html").exists());
        assert!(out.join("index.html").exists());
        Ok(())
    }

    #[tokio::test]
    async fn biographies_page_can_open_its_modal_links() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let out = temp.path().join("site");
        let source = CountingSource::with(&[
            ("bio/a.md", "См. [заметку](notes/n.md)."),
            ("notes/n.md", "Заметка."),
        ]);
        let data = SiteData {
            biography: Some(BiographyData {
                people: vec![person("a", "bio/a.md")],
                places: Vec::new(),
            }),
            ..SiteData::default()
        };

        build_site(&data, &SiteConfig::default(), &source, &out, false).await?;

        let page = std::fs::read_to_string(out.join("biographies.html"))?;
        assert!(page.contains(r#"class="markdown-link modal-trigger" data-md="notes/n.md""#));
        assert!(page.contains(r#"<div class="modal-overlay" hidden>"#));
        assert!(out.join("fragments").join("notes").join("n.md.html").exists());

        let person = std::fs::read_to_string(out.join("person").join("a.html"))?;
        assert_eq!(person.matches(r#"class="modal-overlay""#).count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn plain_links_resolve_from_subdirectory_pages() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let out = temp.path().join("site");
        let source = CountingSource::with(&[
            ("bio/a.md", "# Жизнь\nСм. [заметку](notes/n.md).\n"),
            ("notes/n.md", "Дальше [ещё](notes/m.md) и [сайт](https://example.com)."),
            ("notes/m.md", "Последняя."),
        ]);
        let data = SiteData {
            biography: Some(BiographyData {
                people: vec![person("a", "bio/a.md")],
                places: Vec::new(),
            }),
            ..SiteData::default()
        };
        let config = SiteConfig {
            link_mode: LinkMode::Plain,
            ..SiteConfig::default()
        };

        let report = build_site(&data, &config, &source, &out, false).await?;

        let person = std::fs::read_to_string(out.join("person").join("a.html"))?;
        assert!(person.contains(r#"<a href="../docs/notes/n.md.html" class="markdown-link">"#));
        let target = out.join("person").join("../docs/notes/n.md.html");
        assert!(target.exists());

        let doc = std::fs::read_to_string(target)?;
        assert!(doc.contains(r#"data-root="../../""#));
        assert!(doc.contains(r#"<a href="../../docs/notes/m.md.html" class="markdown-link">"#));
        assert!(doc.contains(r#"href="https://example.com""#));
        assert!(out.join("docs").join("notes").join("m.md.html").exists());
        assert!(!out.join("fragments").exists());
        assert_eq!(report.fragments, 2);
        Ok(())
    }

    #[tokio::test]
    async fn rebuild_requires_force() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let out = temp.path().join("site");
        let source = CountingSource::default();
        let data = SiteData::default();
        let config = SiteConfig::default();

        build_site(&data, &config, &source, &out, false).await?;
        assert!(build_site(&data, &config, &source, &out, false).await.is_err());
        build_site(&data, &config, &source, &out, true).await?;
        Ok(())
    }
}
