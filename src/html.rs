//! HTML escaping and the document shell shared by every generated page.

/// Escape text for use between tags.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for use inside a double-quoted attribute.
pub fn escape_attr(input: &str) -> String {
    escape_html(input).replace('"', "&quot;")
}

/// Reverse of [`escape_attr`] for the entities it produces.
pub fn unescape_attr(input: &str) -> String {
    input
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// A link in the site-wide navigation bar.
#[derive(Debug, Clone, Copy)]
pub struct NavLink {
    pub href: &'static str,
    pub label: &'static str,
}

pub const SITE_NAV: &[NavLink] = &[
    NavLink {
        href: "index.html",
        label: "Семинары",
    },
    NavLink {
        href: "biography.html",
        label: "Персоналии",
    },
    NavLink {
        href: "biographies.html",
        label: "Биографии",
    },
    NavLink {
        href: "meetings.html",
        label: "Встречи",
    },
    NavLink {
        href: "meetings-table.html",
        label: "Таблица встреч",
    },
    NavLink {
        href: "materials.html",
        label: "Материалы",
    },
];

/// Wrap a body fragment into a full HTML document.
///
/// `root` is the relative prefix from the page to the site root (`""` or
/// `"../"`); the embedded script uses it to locate modal fragments. Every
/// page carries a closed modal container for modal-trigger links.
pub fn wrap_document(site_title: &str, page_title: &str, root: &str, body_html: &str) -> String {
    let mut out = String::new();
    out.push_str("<!doctype html>\n");
    out.push_str("<html lang=\"ru\">\n");
    out.push_str("<head>\n");
    out.push_str("  <meta charset=\"utf-8\">\n");
    out.push_str(
        "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
    );
    out.push_str(&format!("  <title>{}</title>\n", escape_html(page_title)));
    out.push_str("  <style>\n");
    out.push_str(STYLE_CSS);
    out.push_str("  </style>\n");
    out.push_str("</head>\n");
    out.push_str(&format!("<body data-root=\"{}\">\n", escape_attr(root)));

    out.push_str("<header class=\"site-header\">\n");
    out.push_str(&format!(
        "  <a class=\"site-title\" href=\"{}index.html\">{}</a>\n",
        escape_attr(root),
        escape_html(site_title)
    ));
    out.push_str("  <nav class=\"site-nav\">\n");
    for link in SITE_NAV {
        out.push_str(&format!(
            "    <a href=\"{}{}\">{}</a>\n",
            escape_attr(root),
            link.href,
            link.label
        ));
    }
    out.push_str("  </nav>\n");
    out.push_str("</header>\n");

    out.push_str("<main class=\"content\">\n");
    out.push_str(body_html);
    if !body_html.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("</main>\n");
    out.push_str(&modal_overlay(false, ""));
    out.push_str("<script>\n");
    out.push_str(SITE_JS);
    out.push_str("</script>\n");
    out.push_str("</body>\n");
    out.push_str("</html>\n");
    out
}

/// Modal container; the embedded script fills `.modal-body` on demand.
pub fn modal_overlay(open: bool, body_html: &str) -> String {
    format!(
        "<div class=\"modal-overlay\"{}>\n\
         <div class=\"modal\" role=\"dialog\">\n\
         <button type=\"button\" class=\"modal-close\" aria-label=\"Закрыть\">×</button>\n\
         <div class=\"modal-body\">{body_html}</div>\n\
         </div>\n</div>\n",
        if open { "" } else { " hidden" }
    )
}

/// Inline error block shown in place of content that could not be loaded.
pub fn error_block(message: &str) -> String {
    format!("<p class=\"error\">{}</p>", escape_html(message))
}

const STYLE_CSS: &str = r#"
body { margin: 0; font-family: Georgia, serif; color: #222; background: #fafaf7; }
.site-header { display: flex; gap: 1.5rem; align-items: baseline; padding: 1rem 2rem; background: #2f3b4c; }
.site-header a { color: #f2f2f2; text-decoration: none; }
.site-title { font-size: 1.3rem; font-weight: bold; }
.site-nav { display: flex; flex-wrap: wrap; gap: 1rem; }
.content { max-width: 1100px; margin: 0 auto; padding: 1.5rem 2rem; }
.error { color: #a40000; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 1.5rem; }
.card { background: #fff; border-radius: 8px; box-shadow: 0 1px 4px rgba(0,0,0,.12); overflow: hidden; }
.image-container { height: 220px; display: flex; align-items: center; justify-content: center; background: #eceae4; }
.image { width: 100%; height: 100%; object-fit: cover; }
.image-placeholder { font-size: 3rem; }
.info { padding: .8rem 1rem; }
.detail-header { display: flex; gap: 1.5rem; align-items: flex-start; margin-bottom: 1.5rem; }
.detail-image { max-width: 220px; border-radius: 8px; }
.detail-body { display: flex; gap: 2rem; align-items: flex-start; }
.toc { flex: 0 0 220px; position: sticky; top: 1rem; }
.toc ul { list-style: none; padding: 0; margin: 0; }
.toc-link { display: block; padding: .35rem .5rem; color: #2f3b4c; text-decoration: none; border-left: 3px solid transparent; }
.toc-link.active { border-left-color: #c0392b; font-weight: bold; }
.content-pane { flex: 1; min-width: 0; }
.content-section[hidden] { display: none; }
.modal-overlay { position: fixed; inset: 0; background: rgba(0,0,0,.55); display: flex; align-items: center; justify-content: center; }
.modal-overlay[hidden] { display: none; }
.modal { background: #fff; max-width: 760px; width: 90%; max-height: 85vh; overflow-y: auto; padding: 1.5rem 2rem; border-radius: 8px; position: relative; }
.modal-close { position: absolute; top: .5rem; right: .75rem; border: 0; background: none; font-size: 1.6rem; cursor: pointer; }
.seminar-card { background: #fff; border-radius: 8px; margin-bottom: 1rem; box-shadow: 0 1px 4px rgba(0,0,0,.12); }
.seminar-header { display: flex; justify-content: space-between; gap: 1rem; padding: 1rem 1.5rem; cursor: pointer; }
.seminar-content { display: none; padding: 0 1.5rem 1rem; }
.seminar-content.active { display: block; }
.chevron.rotated { transform: rotate(180deg); }
.occupation-tag { display: inline-block; margin: 0 .4rem .4rem 0; padding: .15rem .6rem; border-radius: 999px; background: #eceae4; }
.places-info { display: flex; gap: 1rem; flex-wrap: wrap; }
.place-card { background: #f3f1ec; padding: .75rem 1rem; border-radius: 6px; }
table.meetings-table { border-collapse: collapse; width: 100%; }
table.meetings-table td, table.meetings-table th { border: 1px solid #ccc; padding: .5rem; vertical-align: top; }
"#;

const SITE_JS: &str = r##"
(function () {
  var root = document.body.dataset.root || "";

  document.querySelectorAll(".toc-link[data-section]").forEach(function (link) {
    link.addEventListener("click", function (event) {
      event.preventDefault();
      var id = link.dataset.section;
      document.querySelectorAll(".content-section").forEach(function (section) {
        section.hidden = section.dataset.section !== id;
      });
      document.querySelectorAll(".toc-link").forEach(function (other) {
        other.classList.toggle("active", other === link);
      });
    });
  });

  var overlay = document.querySelector(".modal-overlay");
  var modalBody = overlay ? overlay.querySelector(".modal-body") : null;

  function fragmentUrl(path) {
    var segments = path.split("#")[0].split("?")[0].trim().split("/").filter(function (segment) {
      return segment !== "" && segment !== ".";
    });
    return root + "fragments/" + segments.join("/") + ".html";
  }

  function rebaseLinks(container) {
    container.querySelectorAll("a.markdown-link[href]").forEach(function (link) {
      var href = link.getAttribute("href");
      if (!/^([a-z][a-z0-9+.-]*:|[#\/?])/i.test(href)) link.setAttribute("href", root + href);
    });
  }

  function closeModal() {
    if (!overlay) return;
    overlay.hidden = true;
    modalBody.innerHTML = "";
  }

  function openModal(path) {
    if (!overlay) return;
    modalBody.innerHTML = "<p class=\"loading\">Загрузка…</p>";
    overlay.hidden = false;
    fetch(fragmentUrl(path))
      .then(function (response) {
        if (!response.ok) throw new Error("HTTP " + response.status);
        return response.text();
      })
      .then(function (html) {
        modalBody.innerHTML = html;
        rebaseLinks(modalBody);
      })
      .catch(function () {
        modalBody.innerHTML = "<p class=\"error\">Не удалось загрузить материал</p>";
      });
  }

  document.addEventListener("click", function (event) {
    var trigger = event.target.closest ? event.target.closest(".modal-trigger") : null;
    if (trigger) {
      event.preventDefault();
      openModal(trigger.dataset.md);
      return;
    }
    if (event.target.closest && event.target.closest(".modal-close")) {
      closeModal();
      return;
    }
    if (overlay && event.target === overlay) closeModal();
  });

  document.addEventListener("keydown", function (event) {
    if (event.key === "Escape") closeModal();
  });

  document.querySelectorAll(".seminar-header").forEach(function (header) {
    header.addEventListener("click", function () {
      var content = header.nextElementSibling;
      if (content) content.classList.toggle("active");
      var chevron = header.querySelector(".chevron");
      if (chevron) chevron.classList.toggle("rotated");
    });
  });
})();
"##;
