//! Place detail pages.

use crate::detail::{DetailItem, ItemKind, PageHeader};
use crate::formats::{ItemId, LifeEvent, Person, Place};
use crate::html::{escape_attr, escape_html};
use crate::markdown::{LinkMode, render_inline_links};

/// Human-readable name of a place type; unknown types are shown as is.
pub fn place_type_label(kind: &str) -> &str {
    match kind {
        "settlement" => "Населённый пункт",
        "village" => "Деревня",
        "city" => "Город",
        "station" => "Станция",
        "area" => "Местность",
        other => other,
    }
}

/// A place together with the people born or died there.
#[derive(Debug, Clone)]
pub struct PlaceView<'a> {
    pub place: &'a Place,
    pub related: Vec<&'a Person>,
}

impl<'a> PlaceView<'a> {
    pub fn new(place: &'a Place, people: &'a [Person]) -> Self {
        let related = people
            .iter()
            .filter(|person| relation(person, &place.id).is_some())
            .collect();
        Self { place, related }
    }

    fn name(&self) -> &str {
        self.place
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("Место")
    }
}

fn relation(person: &Person, place_id: &ItemId) -> Option<&'static str> {
    let at = |event: &Option<LifeEvent>| {
        event
            .as_ref()
            .and_then(|e| e.place_id.as_ref())
            .is_some_and(|id| id == place_id)
    };
    if at(&person.birth) {
        Some("📍 Родился здесь")
    } else if at(&person.death) {
        Some("⚰️ Умер здесь")
    } else {
        None
    }
}

impl DetailItem for PlaceView<'_> {
    fn kind(&self) -> ItemKind {
        ItemKind::Place
    }

    fn id(&self) -> &ItemId {
        &self.place.id
    }

    fn header(&self) -> PageHeader {
        PageHeader {
            title: self.name().to_owned(),
            subtitle: self
                .place
                .kind
                .as_deref()
                .map(|kind| place_type_label(kind).to_owned()),
            media: Vec::new(),
            description: None,
        }
    }

    fn markdown_path(&self) -> Option<&str> {
        None
    }

    fn fallback_html(&self) -> String {
        String::new()
    }

    fn page_title(&self) -> String {
        format!("{} - Информация о месте", self.name())
    }

    fn extra_html(&self, link_mode: LinkMode) -> String {
        let mut out = String::new();

        out.push_str("<div class=\"place-description\">\n");
        match self.place.description.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                out.push_str(&format!("<p>{}</p>\n", render_inline_links(text, link_mode)));
            }
            _ => out.push_str("<p>Описание отсутствует</p>\n"),
        }
        out.push_str("</div>\n");

        if let Some(coordinates) = self.place.coordinates {
            out.push_str(&format!(
                "<p class=\"place-coordinates\">Широта: {}, Долгота: {}</p>\n",
                coordinates.lat, coordinates.lon
            ));
        }

        out.push_str("<section class=\"related-people\">\n<h2>Связанные люди</h2>\n");
        if self.related.is_empty() {
            out.push_str("<p>Нет связанных людей</p>\n");
        } else {
            out.push_str("<div class=\"people-list\">\n");
            for person in &self.related {
                let name = person.full_name.as_deref().unwrap_or("Без имени");
                out.push_str(&format!(
                    "<a href=\"person/{}.html\" class=\"person-card-link\"><div class=\"person-card\"><h4>{}</h4><p>{}</p></div></a>\n",
                    escape_attr(person.id.as_str()),
                    escape_html(name),
                    relation(person, &self.place.id).unwrap_or_default(),
                ));
            }
            out.push_str("</div>\n");
        }
        out.push_str("</section>\n");
        out
    }
}
