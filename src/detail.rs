//! Detail pages: header, section navigation, content pane and modal.
//!
//! [`PageState`] is the immutable record a page is rendered from; rendering
//! is a pure function of it plus the selected section id. [`DetailSession`]
//! drives the interactive transitions (section switches, modal open/close)
//! over a page state and a [`MarkdownSource`].

use crate::dates;
use crate::formats::{GenericItem, ItemId, Meeting, Person, markdown_path};
use crate::html::{error_block, escape_attr, escape_html, modal_overlay};
use crate::markdown::{self, LinkMode};
use crate::sections::{self, NavEntry, Section};
use crate::source::MarkdownSource;

pub const NOT_FOUND_MESSAGE: &str = "Элемент не найден";
pub const CONTENT_LOAD_ERROR: &str = "Не удалось загрузить дополнительный контент";
pub const MODAL_LOAD_ERROR: &str = "Не удалось загрузить материал";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Person,
    Meeting,
    Book,
    Place,
}

impl ItemKind {
    /// Output directory of the item's pages.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Meeting => "meeting",
            Self::Book => "book",
            Self::Place => "place",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Media {
    Image { src: String, alt: String },
    Audio { src: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageHeader {
    pub title: String,
    pub subtitle: Option<String>,
    pub media: Vec<Media>,
    /// Trusted HTML shown under the title.
    pub description: Option<String>,
}

/// A record that can be shown on a detail page.
pub trait DetailItem: Sync {
    fn kind(&self) -> ItemKind;
    fn id(&self) -> &ItemId;
    fn header(&self) -> PageHeader;
    /// Markdown document holding the page body, if any.
    fn markdown_path(&self) -> Option<&str>;
    /// Body shown when there is no Markdown document.
    fn fallback_html(&self) -> String;
    fn page_title(&self) -> String;

    /// Markup placed between the header and the section area.
    fn extra_html(&self, _link_mode: LinkMode) -> String {
        String::new()
    }
}

impl DetailItem for Person {
    fn kind(&self) -> ItemKind {
        ItemKind::Person
    }

    fn id(&self) -> &ItemId {
        &self.id
    }

    fn header(&self) -> PageHeader {
        let title = non_blank(self.full_name.as_deref())
            .unwrap_or("Без имени")
            .to_owned();
        let media = non_blank(self.img.as_deref())
            .map(|src| Media::Image {
                src: src.to_owned(),
                alt: title.clone(),
            })
            .into_iter()
            .collect();
        PageHeader {
            subtitle: dates::format_life_dates(
                self.birth.as_ref().and_then(|e| e.date.as_deref()),
                self.death.as_ref().and_then(|e| e.date.as_deref()),
            ),
            title,
            media,
            description: None,
        }
    }

    fn markdown_path(&self) -> Option<&str> {
        markdown_path(self.biography_text.as_deref())
    }

    fn fallback_html(&self) -> String {
        let inline = self
            .biography_text
            .as_deref()
            .filter(|text| markdown_path(Some(text)).is_none());
        non_blank(inline)
            .or_else(|| non_blank(self.description.as_deref()))
            .or_else(|| non_blank(self.bio.as_ref().and_then(|b| b.short.as_deref())))
            .map(str::to_owned)
            .unwrap_or_else(|| "<p>Биография отсутствует</p>".to_owned())
    }

    fn page_title(&self) -> String {
        let name = non_blank(self.full_name.as_deref()).unwrap_or("Биография");
        format!("{name} - Биография")
    }
}

impl DetailItem for Meeting {
    fn kind(&self) -> ItemKind {
        ItemKind::Meeting
    }

    fn id(&self) -> &ItemId {
        &self.id
    }

    fn header(&self) -> PageHeader {
        let title = non_blank(self.title.as_deref())
            .unwrap_or("Без названия")
            .to_owned();
        let mut media = Vec::new();
        if let Some(src) = non_blank(self.image.as_deref()) {
            media.push(Media::Image {
                src: src.to_owned(),
                alt: title.clone(),
            });
        }
        if let Some(src) = non_blank(self.audio.as_deref()) {
            media.push(Media::Audio {
                src: src.to_owned(),
            });
        }
        PageHeader {
            subtitle: non_blank(self.date.as_deref()).map(dates::format_meeting_date),
            title,
            media,
            description: None,
        }
    }

    fn markdown_path(&self) -> Option<&str> {
        markdown_path(self.notes.as_deref())
    }

    fn fallback_html(&self) -> String {
        non_blank(self.description.as_deref())
            .map(str::to_owned)
            .unwrap_or_else(|| "<p>Контент отсутствует</p>".to_owned())
    }

    fn page_title(&self) -> String {
        let title = non_blank(self.title.as_deref()).unwrap_or("Встреча");
        format!("{title} - Встреча")
    }
}

impl GenericItem {
    fn display_title(&self) -> Option<&str> {
        non_blank(self.full_name.as_deref())
            .or_else(|| non_blank(self.title.as_deref()))
            .or_else(|| non_blank(self.name.as_deref()))
    }
}

impl DetailItem for GenericItem {
    fn kind(&self) -> ItemKind {
        ItemKind::Book
    }

    fn id(&self) -> &ItemId {
        &self.id
    }

    fn header(&self) -> PageHeader {
        PageHeader {
            title: self.display_title().unwrap_or("Без названия").to_owned(),
            subtitle: None,
            media: Vec::new(),
            description: non_blank(self.description.as_deref()).map(str::to_owned),
        }
    }

    fn markdown_path(&self) -> Option<&str> {
        markdown_path(self.biography_text.as_deref())
            .or_else(|| markdown_path(self.notes.as_deref()))
    }

    fn fallback_html(&self) -> String {
        String::new()
    }

    fn page_title(&self) -> String {
        let title = self.display_title().unwrap_or("Детали");
        format!("{title} - Подробности")
    }
}

/// Everything a detail page is rendered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    pub kind: ItemKind,
    pub page_title: String,
    pub header: PageHeader,
    pub sections: Vec<Section>,
    /// Body used when there are no sections.
    pub fallback_html: String,
    pub extra_html: String,
    pub link_mode: LinkMode,
}

impl PageState {
    /// Build the state for `item`, fetching its Markdown document once.
    ///
    /// A failed fetch leaves the page without sections and an inline error
    /// in the content pane.
    pub async fn load(
        item: &dyn DetailItem,
        source: &dyn MarkdownSource,
        link_mode: LinkMode,
    ) -> Self {
        let mut fallback_html = item.fallback_html();
        let mut sections = Vec::new();

        if let Some(path) = item.markdown_path() {
            match source.fetch(path).await {
                Ok(text) => {
                    sections = sections::split(&text);
                    tracing::debug!(path, sections = sections.len(), "loaded page markdown");
                }
                Err(err) => {
                    tracing::warn!(path, ?err, "failed to load page markdown");
                    fallback_html = error_block(CONTENT_LOAD_ERROR);
                }
            }
        }

        Self {
            kind: item.kind(),
            page_title: item.page_title(),
            header: item.header(),
            sections,
            fallback_html,
            extra_html: item.extra_html(link_mode),
            link_mode,
        }
    }

    pub fn navigation(&self) -> Vec<NavEntry> {
        sections::outline(&self.sections)
    }

    /// The section with `id`, or the first section when `id` is unknown.
    pub fn section_or_first(&self, id: Option<&str>) -> Option<&Section> {
        id.and_then(|id| self.sections.iter().find(|s| s.id == id))
            .or_else(|| self.sections.first())
    }

    pub fn render_section(&self, id: &str) -> Option<String> {
        self.sections
            .iter()
            .find(|s| s.id == id)
            .map(|s| markdown::render(&s.raw_content, self.link_mode))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    Loading { path: String },
    Loaded { path: String, html: String },
    Error { path: String, message: String },
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    fn body_html(&self) -> String {
        match self {
            Self::Closed => String::new(),
            Self::Loading { .. } => "<p class=\"loading\">Загрузка…</p>".to_owned(),
            Self::Loaded { html, .. } => html.clone(),
            Self::Error { message, .. } => error_block(message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseTrigger {
    CloseButton,
    Backdrop,
    Escape,
}

/// Fetch and convert the document behind a modal-trigger link.
pub async fn load_fragment(
    source: &dyn MarkdownSource,
    path: &str,
    link_mode: LinkMode,
) -> ModalState {
    match source.fetch(path).await {
        Ok(text) => ModalState::Loaded {
            path: path.to_owned(),
            html: markdown::render(&text, link_mode),
        },
        Err(err) => {
            tracing::warn!(path, ?err, "failed to load linked markdown");
            ModalState::Error {
                path: path.to_owned(),
                message: MODAL_LOAD_ERROR.to_owned(),
            }
        }
    }
}

/// Interactive view of one detail page.
pub struct DetailSession<'a> {
    state: PageState,
    selected: Option<String>,
    content: String,
    modal: ModalState,
    source: &'a dyn MarkdownSource,
}

impl<'a> DetailSession<'a> {
    /// Load the page and display its first section.
    pub async fn load(
        item: &dyn DetailItem,
        source: &'a dyn MarkdownSource,
        link_mode: LinkMode,
    ) -> DetailSession<'a> {
        let state = PageState::load(item, source, link_mode).await;
        Self::from_state(state, source)
    }

    pub fn from_state(state: PageState, source: &'a dyn MarkdownSource) -> Self {
        let mut session = Self {
            state,
            selected: None,
            content: String::new(),
            modal: ModalState::Closed,
            source,
        };
        match session.state.sections.first().map(|s| s.id.clone()) {
            Some(first) => {
                session.select_section(&first);
            }
            None => session.content = session.state.fallback_html.clone(),
        }
        session
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Rendered HTML of the content pane.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn navigation(&self) -> Vec<NavEntry> {
        self.state.navigation()
    }

    /// Show section `id`. Returns false (and changes nothing) for an unknown id.
    pub fn select_section(&mut self, id: &str) -> bool {
        let Some(html) = self.state.render_section(id) else {
            return false;
        };
        self.selected = Some(id.to_owned());
        self.content = html;
        true
    }

    /// Open the modal for a modal-trigger link, fetching `path` once.
    pub async fn open_modal(&mut self, path: &str) -> &ModalState {
        self.modal = ModalState::Loading {
            path: path.to_owned(),
        };
        self.modal = load_fragment(self.source, path, self.state.link_mode).await;
        &self.modal
    }

    pub fn close_modal(&mut self, trigger: CloseTrigger) {
        if self.modal.is_open() {
            tracing::debug!(?trigger, "close modal");
        }
        self.modal = ModalState::Closed;
    }

    /// Full page markup for the current state.
    pub fn render(&self) -> String {
        render_with(&self.state, self.selected.as_deref(), Panes::Selected, Some(&self.modal))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panes {
    Selected,
    All,
}

/// Page markup with only the selected section (or the first) in the pane.
pub fn render_page(state: &PageState, selected: Option<&str>) -> String {
    render_with(state, selected, Panes::Selected, Some(&ModalState::Closed))
}

/// Page markup with every section present and all but the first hidden.
///
/// Used for static output where the embedded script switches sections. The
/// modal container comes from the page shell.
pub fn render_static_page(state: &PageState) -> String {
    render_with(state, None, Panes::All, None)
}

/// Inline message for a record id with no matching entry.
pub fn render_not_found() -> String {
    format!(
        "<article class=\"item-detail\">\n<p class=\"not-found\">{NOT_FOUND_MESSAGE}</p>\n</article>\n"
    )
}

fn render_with(
    state: &PageState,
    selected: Option<&str>,
    panes: Panes,
    modal: Option<&ModalState>,
) -> String {
    let active = state.section_or_first(selected).map(|s| s.id.as_str());

    let mut out = String::new();
    out.push_str(&format!(
        "<article class=\"item-detail item-{}\">\n",
        state.kind.dir_name()
    ));
    render_header(&mut out, &state.header);
    if !state.extra_html.is_empty() {
        out.push_str(&state.extra_html);
        if !state.extra_html.ends_with('\n') {
            out.push('\n');
        }
    }

    out.push_str("<div class=\"detail-body\">\n");
    if !state.sections.is_empty() {
        out.push_str("<nav class=\"toc\">\n<ul>\n");
        for entry in state.navigation() {
            let class = if Some(entry.section_id.as_str()) == active {
                "toc-link active"
            } else {
                "toc-link"
            };
            out.push_str(&format!(
                "<li><a href=\"#{id}\" class=\"{class}\" data-section=\"{id}\">{title}</a></li>\n",
                id = escape_attr(&entry.section_id),
                title = escape_html(&entry.title),
            ));
        }
        out.push_str("</ul>\n</nav>\n");
    }

    out.push_str("<div class=\"content-pane\">\n");
    if state.sections.is_empty() {
        out.push_str(&state.fallback_html);
        out.push('\n');
    }
    for section in &state.sections {
        let is_active = Some(section.id.as_str()) == active;
        if panes == Panes::Selected && !is_active {
            continue;
        }
        out.push_str(&format!(
            "<section class=\"content-section\" data-section=\"{}\"{}>\n",
            escape_attr(&section.id),
            if is_active { "" } else { " hidden" }
        ));
        out.push_str(&markdown::render(&section.raw_content, state.link_mode));
        out.push_str("\n</section>\n");
    }
    out.push_str("</div>\n</div>\n");

    if let Some(modal) = modal {
        out.push_str(&modal_overlay(modal.is_open(), &modal.body_html()));
    }
    out.push_str("</article>\n");
    out
}

fn render_header(out: &mut String, header: &PageHeader) {
    out.push_str("<header class=\"detail-header\">\n");
    for media in &header.media {
        if let Media::Image { src, alt } = media {
            out.push_str(&format!(
                "<img class=\"detail-image\" src=\"{}\" alt=\"{}\">\n",
                escape_attr(src),
                escape_attr(alt)
            ));
        }
    }
    out.push_str("<div class=\"detail-info\">\n");
    out.push_str(&format!("<h1>{}</h1>\n", escape_html(&header.title)));
    if let Some(subtitle) = &header.subtitle {
        out.push_str(&format!("<p class=\"date\">{}</p>\n", escape_html(subtitle)));
    }
    if let Some(description) = &header.description {
        out.push_str(&format!("<p class=\"item-description\">{description}</p>\n"));
    }
    for media in &header.media {
        if let Media::Audio { src } = media {
            out.push_str("<div class=\"audio-player\">\n<audio controls>\n");
            out.push_str(&format!(
                "<source src=\"{}\" type=\"audio/mpeg\">\nВаш браузер не поддерживает аудио.\n",
                escape_attr(src)
            ));
            out.push_str("</audio>\n</div>\n");
        }
    }
    out.push_str("</div>\n</header>\n");
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
