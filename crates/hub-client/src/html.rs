//! Scraping of the hub's list and edit pages
//!
//! The hub only renders resource inventories as HTML tables meant for a
//! browser. This module pulls rows out of those tables with a handful of
//! regular expressions; it does not attempt to be a general HTML parser.
//! Every function here is pure so it can be tested against captured pages.

use std::sync::LazyLock;

use hub_core::{CodeType, Resource, ResourceId};
use regex::{Captures, Regex};
use serde::Serialize;

static ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr\b([^>]*)>(.*?)</tr>").expect("Invalid row regex"));

static CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>").expect("Invalid cell regex"));

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a>").expect("Invalid link regex"));

static INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<input\b([^>]*)>").expect("Invalid input regex"));

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:div|li)\b[^>]*>(.*?)</(?:div|li)>").expect("Invalid label regex")
});

static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("Invalid attribute regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("Invalid tag regex"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("Invalid entity regex")
});

/// A device as listed on `/device/list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub id: ResourceId,
    pub name: String,
    pub driver: String,
    pub source: String,
}

/// An installed app instance as listed on `/installedapp/list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledApp {
    pub id: ResourceId,
    pub name: String,
    /// Name of the app code the instance runs
    pub app: String,
}

/// Result of submitting the "new code" form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavePage {
    Saved { id: ResourceId, version: u64 },
    Rejected { message: String },
}

/// Table id and row class listing resources of a code type
fn code_table(kind: CodeType) -> (&'static str, &'static str) {
    match kind {
        CodeType::App => ("hubitapps-table", "app-row"),
        CodeType::Driver => ("devicetype-table", "driver-row"),
    }
}

/// Parse an app or driver list page.
///
/// Returns `None` when the page does not contain the expected table. Rows
/// without a numeric id are skipped; rows with an empty name or namespace
/// are kept so the caller can report them.
pub fn parse_code_list(html: &str, kind: CodeType) -> Option<Vec<Resource>> {
    let (table, row_class) = code_table(kind);
    let body = table_body(html, table)?;

    let resources = rows(body, row_class)
        .filter_map(|(attrs, inner)| {
            let id = numeric_attr(attrs, "data-app-id")?;
            let cells = cells(inner);
            let name = cells
                .first()
                .map(|cell| match LINK.captures(cell) {
                    Some(link) => text(&link[2]),
                    None => text(cell),
                })
                .unwrap_or_default();
            let namespace = cells.get(1).map(|cell| text(cell)).unwrap_or_default();

            Some(Resource {
                id,
                kind,
                name,
                namespace,
            })
        })
        .collect();
    Some(resources)
}

/// Parse the device list page.
pub fn parse_device_list(html: &str) -> Option<Vec<Device>> {
    let body = table_body(html, "device-table")?;

    let devices = rows(body, "device-row")
        .filter_map(|(attrs, inner)| {
            let id = numeric_attr(attrs, "data-device-id")?;
            let cells = cells(inner);
            let cell_text = |i: usize| cells.get(i).map(|c| text(c)).unwrap_or_default();

            // The name cell also lists the label on following lines
            let name = cell_text(1).lines().next().unwrap_or_default().trim().to_string();
            Some(Device {
                id,
                name,
                driver: cell_text(2),
                source: cell_text(3),
            })
        })
        .collect();
    Some(devices)
}

/// Parse the installed-app list page.
///
/// One row can hold a parent app and its children; each configure link in
/// the first cell is one instance, paired by position with the app-type
/// labels in the second cell.
pub fn parse_installed_list(html: &str) -> Option<Vec<InstalledApp>> {
    let body = table_body(html, "app-table")?;
    let mut apps = Vec::new();

    for (_, inner) in rows(body, "app-row") {
        let cells = cells(inner);
        let Some(name_cell) = cells.first() else {
            continue;
        };
        let labels: Vec<String> = cells
            .get(1)
            .map(|cell| LABEL.captures_iter(cell).map(|c| text(&c[1])).collect())
            .unwrap_or_default();

        let links = LINK.captures_iter(name_cell).filter_map(|link| {
            let href = attr(&link[1], "href")?;
            let id = configure_id(&href)?;
            Some((id, text(&link[2])))
        });

        for (i, (id, name)) in links.enumerate() {
            apps.push(InstalledApp {
                id,
                name,
                app: labels.get(i).cloned().unwrap_or_default(),
            });
        }
    }
    Some(apps)
}

/// Parse the page returned after creating new code.
///
/// Returns `None` when the page has neither an error block nor an edit
/// form carrying the new id and version.
pub fn parse_save_page(html: &str) -> Option<SavePage> {
    if let Some(errors) = element_by_id(html, "errors", "</div>") {
        let message = text(errors).replace('×', "").trim().to_string();
        if !message.is_empty() {
            return Some(SavePage::Rejected { message });
        }
    }

    let form = element_by_attr(html, r#"name="editForm""#, "</form>")?;
    let mut id = None;
    let mut version = None;
    for input in INPUT.captures_iter(form) {
        let attrs = &input[1];
        match attr(attrs, "name").as_deref() {
            Some("id") => id = attr(attrs, "value").and_then(|v| v.trim().parse().ok()),
            Some("version") => version = attr(attrs, "value").and_then(|v| v.trim().parse().ok()),
            _ => {}
        }
    }

    Some(SavePage::Saved {
        id: id?,
        version: version?,
    })
}

/// Content of the `<tbody>` of the table with `table_id`.
fn table_body<'a>(html: &'a str, table_id: &str) -> Option<&'a str> {
    let start = find_attr(html, "id", table_id)?;
    let rest = &html[start..];
    let body = &rest[rest.find("<tbody")?..];
    let body = &body[body.find('>')? + 1..];
    let end = body.find("</tbody>").unwrap_or(body.len());
    Some(&body[..end])
}

/// Content of the element whose `id` is `id`, up to `close`.
fn element_by_id<'a>(html: &'a str, id: &str, close: &str) -> Option<&'a str> {
    let start = find_attr(html, "id", id)?;
    element_from(html, start, close)
}

fn element_by_attr<'a>(html: &'a str, needle: &str, close: &str) -> Option<&'a str> {
    let start = html.find(needle)?;
    element_from(html, start, close)
}

fn element_from<'a>(html: &'a str, start: usize, close: &str) -> Option<&'a str> {
    let rest = &html[start..];
    let content = &rest[rest.find('>')? + 1..];
    let end = content.find(close).unwrap_or(content.len());
    Some(&content[..end])
}

fn find_attr(html: &str, name: &str, value: &str) -> Option<usize> {
    html.find(&format!("{name}=\"{value}\""))
        .or_else(|| html.find(&format!("{name}='{value}'")))
}

/// `(attributes, inner html)` of every row carrying `class`.
fn rows<'a>(body: &'a str, class: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    ROW.captures_iter(body).filter_map(move |row| {
        let attrs = row.get(1)?.as_str();
        let inner = row.get(2)?.as_str();
        has_class(attrs, class).then_some((attrs, inner))
    })
}

fn cells(row: &str) -> Vec<&str> {
    CELL.captures_iter(row)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

fn has_class(attrs: &str, class: &str) -> bool {
    attr(attrs, "class").is_some_and(|value| value.split_whitespace().any(|c| c == class))
}

/// Value of attribute `name` within a tag's attribute text.
fn attr(attrs: &str, name: &str) -> Option<String> {
    ATTR.captures_iter(attrs)
        .find(|c| c[1].eq_ignore_ascii_case(name))
        .and_then(|c| c.get(2).or_else(|| c.get(3)).or_else(|| c.get(4)))
        .map(|m| decode_entities(m.as_str()))
}

fn numeric_attr(attrs: &str, name: &str) -> Option<ResourceId> {
    let value = attr(attrs, name)?;
    match value.trim().parse() {
        Ok(id) => Some(id),
        Err(_) => {
            tracing::warn!(attribute = name, value = %value, "skipping row without a numeric id");
            None
        }
    }
}

/// Id at the end of `/installedapp/configure/<id>`.
fn configure_id(href: &str) -> Option<ResourceId> {
    let rest = href.split("/installedapp/configure/").nth(1)?;
    rest.split(['/', '?', '#']).next()?.parse().ok()
}

/// Text content of an HTML fragment, trimmed.
fn text(fragment: &str) -> String {
    decode_entities(&TAG.replace_all(fragment, "")).trim().to_string()
}

fn decode_entities(value: &str) -> String {
    ENTITY
        .replace_all(value, |c: &Captures| {
            let entity = &c[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    "times" => Some('×'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| c[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const APP_LIST: &str = r#"
        <html><body>
        <table id="hubitapps-table" class="table">
          <thead><tr><th>Name</th><th>Namespace</th></tr></thead>
          <tbody>
            <tr class="app-row" data-app-id="12">
              <td><a href="/app/editor/12">Motion   Lights</a></td>
              <td>acme</td>
            </tr>
            <tr class="app-row" data-app-id="15">
              <td><a href="/app/editor/15">Tom &amp; Jerry</a> <span class="badge">OAuth</span></td>
              <td> jdoe </td>
            </tr>
            <tr class="app-row" data-app-id="">
              <td><a href="/app/editor/">Broken</a></td>
              <td>acme</td>
            </tr>
          </tbody>
        </table>
        </body></html>
    "#;

    const DRIVER_LIST: &str = r#"
        <table id="devicetype-table">
          <tbody>
            <tr data-app-id="7" class="driver-row odd">
              <td><a href="/driver/editor/7">Door Sensor</a></td>
              <td>acme</td>
            </tr>
            <tr class="driver-row" data-app-id="8">
              <td><a href="/driver/editor/8">Nameless</a></td>
              <td></td>
            </tr>
          </tbody>
        </table>
    "#;

    #[test]
    fn parses_app_rows() {
        let apps = parse_code_list(APP_LIST, CodeType::App).unwrap();
        assert_eq!(
            apps,
            vec![
                Resource {
                    id: 12,
                    kind: CodeType::App,
                    name: "Motion   Lights".into(),
                    namespace: "acme".into(),
                },
                Resource {
                    id: 15,
                    kind: CodeType::App,
                    name: "Tom & Jerry".into(),
                    namespace: "jdoe".into(),
                },
            ]
        );
    }

    #[test]
    fn keeps_driver_rows_with_empty_namespace() {
        let drivers = parse_code_list(DRIVER_LIST, CodeType::Driver).unwrap();
        assert_eq!(drivers.len(), 2);
        assert_eq!(drivers[0].name, "Door Sensor");
        assert_eq!(drivers[1].namespace, "");
    }

    #[test]
    fn missing_table_is_none() {
        assert!(parse_code_list("<html><form id=\"login\"></form></html>", CodeType::App).is_none());
        assert!(parse_code_list(APP_LIST, CodeType::Driver).is_none());
    }

    #[test]
    fn parses_devices() {
        let html = r#"
            <table id="device-table"><tbody>
              <tr class="device-row" data-device-id="31">
                <td><input type="checkbox"></td>
                <td><a href="/device/edit/31">Front Door
                    (Zigbee)</a></td>
                <td>Generic Zigbee Contact Sensor</td>
                <td>System</td>
              </tr>
            </tbody></table>
        "#;
        assert_eq!(
            parse_device_list(html).unwrap(),
            vec![Device {
                id: 31,
                name: "Front Door".into(),
                driver: "Generic Zigbee Contact Sensor".into(),
                source: "System".into(),
            }]
        );
    }

    #[test]
    fn parses_installed_apps_with_children() {
        let html = r#"
            <table id="app-table"><tbody>
              <tr class="app-row">
                <td>
                  <a href="/installedapp/configure/4">Rule Machine</a>
                  <ul><li><a href="/installedapp/configure/9/mainPage">Porch Light</a></li></ul>
                </td>
                <td><div>Rule Machine</div><li>Rule-5.1</li></td>
              </tr>
            </tbody></table>
        "#;
        assert_eq!(
            parse_installed_list(html).unwrap(),
            vec![
                InstalledApp {
                    id: 4,
                    name: "Rule Machine".into(),
                    app: "Rule Machine".into(),
                },
                InstalledApp {
                    id: 9,
                    name: "Porch Light".into(),
                    app: "Rule-5.1".into(),
                },
            ]
        );
    }

    #[test]
    fn save_page_with_form_yields_id_and_version() {
        let html = r#"
            <div id="errors" class="alert"></div>
            <form name="editForm" method="post">
              <input type="hidden" name="id" value="1042"/>
              <input type='hidden' value='1' name='version'>
              <textarea name="source"></textarea>
            </form>
        "#;
        assert_eq!(parse_save_page(html), Some(SavePage::Saved { id: 1042, version: 1 }));
    }

    #[test]
    fn save_page_with_errors_is_rejected() {
        let html = r#"
            <div id="errors" class="alert alert-danger">
              <button type="button" class="close">&times;</button>
              Metadata Error: Please add a definition
            </div>
            <form name="editForm"><input name="id" value=""></form>
        "#;
        assert_eq!(
            parse_save_page(html),
            Some(SavePage::Rejected {
                message: "Metadata Error: Please add a definition".into()
            })
        );
    }

    #[test]
    fn save_page_without_form_is_none() {
        assert_eq!(parse_save_page("<html>Login</html>"), None);
    }

    #[rstest]
    #[case("a &amp; b", "a & b")]
    #[case("&lt;tag&gt;", "<tag>")]
    #[case("&#39;q&#x27;", "'q'")]
    #[case("&bogus; stays", "&bogus; stays")]
    fn decodes_entities(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(decode_entities(input), expected);
    }
}
