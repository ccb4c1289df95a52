//! List pages: card grids, the biography accordion, seminars and materials.

use std::collections::HashMap;

use crate::dates;
use crate::formats::{
    ItemId, LifeEvent, LinkItem, MaterialGroup, Meeting, Person, Place, Seminar, markdown_path,
};
use crate::html::{error_block, escape_attr, escape_html};
use crate::markdown::{self, LinkMode, render_inline_links};
use crate::source::MarkdownSource;

pub fn occupation_label(occupation: &str) -> &str {
    match occupation {
        "writer" => "Писатель",
        "philosopher" => "Философ",
        "cosmonaut" => "Космонавт",
        "pilot" => "Лётчик",
        "scientist" => "Учёный",
        "artist" => "Художник",
        "composer" => "Композитор",
        "inventor" => "Изобретатель",
        other => other,
    }
}

struct Card<'a> {
    href: String,
    image: Option<&'a str>,
    placeholder: &'static str,
    title: &'a str,
    subtitle: String,
}

fn render_grid<'a>(cards: impl IntoIterator<Item = Card<'a>>) -> String {
    let mut out = String::from("<div class=\"grid\">\n");
    let mut empty = true;
    for card in cards {
        empty = false;
        out.push_str("<div class=\"card\">\n");
        out.push_str(&format!(
            "<a href=\"{}\" class=\"image-link\">\n<div class=\"image-container\">\n",
            escape_attr(&card.href)
        ));
        match card.image {
            Some(src) => out.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\" class=\"image\">\n",
                escape_attr(src),
                escape_attr(card.title)
            )),
            None => out.push_str(&format!(
                "<div class=\"image-placeholder\">{}</div>\n",
                card.placeholder
            )),
        }
        out.push_str("</div>\n</a>\n");
        out.push_str(&format!(
            "<div class=\"info\">\n<h3 class=\"name\"><a href=\"{}\">{}</a></h3>\n<p class=\"dates\">{}</p>\n</div>\n",
            escape_attr(&card.href),
            escape_html(card.title),
            escape_html(&card.subtitle)
        ));
        out.push_str("</div>\n");
    }
    out.push_str("</div>\n");
    if empty {
        out.push_str("<p class=\"empty\">Список пуст</p>\n");
    }
    out
}

fn item_href(dir: &str, id: &ItemId) -> String {
    format!("{dir}/{}.html", id.as_str())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn person_dates(person: &Person) -> String {
    dates::format_life_dates(
        person.birth.as_ref().and_then(|e| e.date.as_deref()),
        person.death.as_ref().and_then(|e| e.date.as_deref()),
    )
    .unwrap_or_default()
}

/// Card grid of people linking to their detail pages.
pub fn person_grid(people: &[Person]) -> String {
    render_grid(people.iter().map(|person| Card {
        href: item_href("person", &person.id),
        image: non_blank(person.img.as_deref()),
        placeholder: "📷",
        title: non_blank(person.full_name.as_deref()).unwrap_or("Без имени"),
        subtitle: person_dates(person),
    }))
}

/// Card grid of meetings linking to their detail pages.
pub fn meeting_grid(meetings: &[Meeting]) -> String {
    render_grid(meetings.iter().map(|meeting| Card {
        href: item_href("meeting", &meeting.id),
        image: non_blank(meeting.image.as_deref()),
        placeholder: "📅",
        title: non_blank(meeting.title.as_deref()).unwrap_or("Без названия"),
        subtitle: non_blank(meeting.date.as_deref())
            .map(dates::format_date)
            .unwrap_or_default(),
    }))
}

/// Accordion of full biographies with occupations and birth/death places.
///
/// Biographies stored in Markdown files are fetched one after another; a
/// failed fetch only affects that person's entry.
pub async fn biographies(
    people: &[Person],
    places: &[Place],
    source: &dyn MarkdownSource,
    link_mode: LinkMode,
) -> String {
    let places: HashMap<&ItemId, &Place> = places.iter().map(|p| (&p.id, p)).collect();
    let place_of = |event: &Option<LifeEvent>| {
        event
            .as_ref()
            .and_then(|e| e.place_id.as_ref())
            .and_then(|id| places.get(id).copied())
    };

    let mut out = String::from("<div class=\"biographies-container\">\n");
    for person in people {
        let body = match markdown_path(person.biography_text.as_deref()) {
            Some(path) => match source.fetch(path).await {
                Ok(text) => markdown::render(&text, link_mode),
                Err(err) => {
                    tracing::warn!(path, ?err, "failed to load biography");
                    error_block(&format!("Не удалось загрузить биографию: {path}"))
                }
            },
            None => person.biography_text.clone().unwrap_or_default(),
        };

        out.push_str(&format!(
            "<details class=\"material-item\" id=\"person-{}\">\n",
            escape_attr(person.id.as_str())
        ));
        out.push_str(&format!(
            "<summary class=\"material-summary\">\n<h2 class=\"person-name\"><a href=\"{}\">{}</a></h2>\n<span class=\"person-dates\">{}</span>\n</summary>\n",
            escape_attr(&item_href("person", &person.id)),
            escape_html(non_blank(person.full_name.as_deref()).unwrap_or("Без имени")),
            escape_html(&person_dates(person))
        ));
        out.push_str("<div class=\"material-content\">\n");
        out.push_str(&format!("<div class=\"biography-text\">\n{body}\n</div>\n"));

        if !person.occupations.is_empty() {
            out.push_str("<div class=\"occupations\">");
            for occupation in &person.occupations {
                out.push_str(&format!(
                    "<span class=\"occupation-tag\">{}</span>",
                    escape_html(occupation_label(occupation))
                ));
            }
            out.push_str("</div>\n");
        }

        out.push_str("<div class=\"places-info\">\n");
        place_card(&mut out, "📍 Место рождения", place_of(&person.birth), link_mode, true);
        place_card(&mut out, "⚰️ Место смерти", place_of(&person.death), link_mode, false);
        out.push_str("</div>\n</div>\n</details>\n");
    }
    out.push_str("</div>\n");
    out
}

fn place_card(out: &mut String, heading: &str, place: Option<&Place>, link_mode: LinkMode, always: bool) {
    let Some(place) = place else {
        if always {
            out.push_str(&format!(
                "<div class=\"place-card\">\n<h4>{heading}</h4>\n<span>Не указано</span>\n</div>\n"
            ));
        }
        return;
    };
    out.push_str(&format!("<div class=\"place-card\">\n<h4>{heading}</h4>\n"));
    out.push_str(&format!(
        "<a href=\"{}\" class=\"place-link\">{}</a>\n",
        escape_attr(&item_href("place", &place.id)),
        escape_html(non_blank(place.name.as_deref()).unwrap_or(place.id.as_str()))
    ));
    if let Some(description) = non_blank(place.description.as_deref()) {
        out.push_str(&format!(
            "<div class=\"place-description\">{}</div>\n",
            render_inline_links(description, link_mode)
        ));
    }
    out.push_str("</div>\n");
}

/// Seminar materials and plans are trusted markup; only newlines are converted.
fn with_line_breaks(text: &str) -> String {
    text.trim().replace('\n', "<br>")
}

fn link_list_items(out: &mut String, items: &[LinkItem]) {
    for item in items {
        out.push_str(&format!(
            "<li><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a></li>\n",
            escape_attr(&item.url),
            escape_html(&item.title)
        ));
    }
}

/// Seminar accordion; the first seminar starts expanded.
pub fn seminars(seminars: &[Seminar]) -> String {
    let mut out = String::from("<div class=\"seminars\">\n");
    for (index, seminar) in seminars.iter().enumerate() {
        let open = index == 0;
        out.push_str("<div class=\"seminar-card\">\n<div class=\"seminar-header\">\n<div>\n<h2>");
        if let Some(number) = &seminar.number {
            out.push_str(&format!(
                "<span class=\"seminar-number\">Семинар {}</span> ",
                escape_html(number.as_str())
            ));
        }
        out.push_str(&escape_html(seminar.topic.as_deref().unwrap_or_default()));
        out.push_str("</h2>\n</div>\n");
        out.push_str(&format!(
            "<div class=\"seminar-date\">{}</div>\n<div class=\"chevron{}\">▾</div>\n</div>\n",
            escape_html(seminar.date.as_deref().unwrap_or_default()),
            if open { " rotated" } else { "" }
        ));
        out.push_str(&format!(
            "<div class=\"seminar-content{}\">\n",
            if open { " active" } else { "" }
        ));
        out.push_str(&seminar_body(seminar));
        out.push_str("</div>\n</div>\n");
    }
    out.push_str("</div>\n");
    out
}

fn seminar_body(seminar: &Seminar) -> String {
    let mut out = String::new();

    if let Some(materials) = non_blank(seminar.materials.as_deref()) {
        out.push_str(&format!(
            "<div class=\"section\">\n<h3 class=\"section-title\">Цель и материалы</h3>\n<p>{}</p>\n</div>\n",
            with_line_breaks(materials)
        ));
    }
    if !seminar.literature.is_empty() {
        out.push_str("<div class=\"section\">\n<h3 class=\"section-title\">Основная литература</h3>\n<ul class=\"materials-list\">\n");
        link_list_items(&mut out, &seminar.literature);
        out.push_str("</ul>\n</div>\n");
    }
    if !seminar.additional_materials.is_empty() {
        out.push_str("<div class=\"section\">\n<h3 class=\"section-title\">Дополнительные материалы</h3>\n<ul class=\"materials-list\">\n");
        link_list_items(&mut out, &seminar.additional_materials);
        out.push_str("</ul>\n</div>\n");
    }
    let steps = seminar.plan.as_ref().map(|plan| plan.steps()).unwrap_or_default();
    if !steps.is_empty() {
        out.push_str("<div class=\"section\">\n<h3 class=\"section-title\">План занятия</h3>\n<ol class=\"plan-list\">\n");
        for step in &steps {
            out.push_str(&format!("<li>{}</li>\n", escape_html(step)));
        }
        out.push_str("</ol>\n</div>\n");
    }

    if out.is_empty() {
        out.push_str("<p>Информация о семинаре отсутствует</p>\n");
    }
    out
}

/// One table row per seminar with numbered literature.
pub fn meetings_table(seminars: &[Seminar]) -> String {
    let mut out = String::from(
        "<table class=\"meetings-table\">\n<thead>\n<tr><th>№</th><th>Дата</th><th>Тема</th><th>Литература</th><th>Материалы</th><th>План</th></tr>\n</thead>\n<tbody>\n",
    );
    for seminar in seminars {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(seminar.number.as_ref().map(|n| n.as_str()).unwrap_or_default()),
            escape_html(seminar.date.as_deref().unwrap_or_default()),
            escape_html(seminar.topic.as_deref().unwrap_or_default()),
            literature_cell(&seminar.literature, &seminar.additional_materials),
            with_line_breaks(seminar.materials.as_deref().unwrap_or_default()),
            with_line_breaks(&seminar.plan.as_ref().map(|p| p.as_text()).unwrap_or_default()),
        ));
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

fn literature_cell(literature: &[LinkItem], additional: &[LinkItem]) -> String {
    if literature.is_empty() && additional.is_empty() {
        return "<em>Материалы не добавлены</em>".to_owned();
    }

    let numbered = |items: &[LinkItem]| {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                format!(
                    "{}. <a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a><br>",
                    index + 1,
                    escape_attr(&item.url),
                    escape_html(&item.title)
                )
            })
            .collect::<String>()
    };

    let mut out = numbered(literature);
    if !additional.is_empty() {
        if !literature.is_empty() {
            out.push_str("<br>");
        }
        out.push_str("<strong>Доп материалы</strong><br>");
        out.push_str(&numbered(additional));
    }
    out
}

/// Accordion of material groups; section content is trusted HTML.
pub fn materials(groups: &[MaterialGroup]) -> String {
    let mut out = String::new();
    for group in groups {
        out.push_str("<details class=\"material-section\">\n");
        out.push_str(&format!("<summary>{}</summary>\n", escape_html(&group.title)));
        for section in &group.sections {
            out.push_str("<article class=\"material-content\">\n");
            out.push_str(&format!("<h2>{}</h2>\n", escape_html(&section.title)));
            for content in &section.content {
                out.push_str(&format!("<div class=\"typography-text\">{content}</div>\n"));
            }
            out.push_str("</article>\n");
        }
        out.push_str("</details>\n");
    }
    out
}
