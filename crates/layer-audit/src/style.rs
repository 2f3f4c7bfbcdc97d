//! Style decoders for both stores.
//!
//! The reference store keeps styles as QML documents in its internal style
//! table: the class enumeration lives under the class-id attribute field as
//! a `ValueMap` edit widget. The current store keeps one inline string per
//! style following the grammar `"Display Name[classId]"`, with a geometry
//! marker embedded in the display text.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;

use crate::catalog::StyleInfo;
use crate::geometry::{GeometrySet, GeometryType};

/// Display marker for point (sign) styles in the current store.
const SIGN_MARKER: &str = "Знак";
/// Display marker for line/polygon (outline) styles in the current store.
const OUTLINE_MARKER: &str = "Контур";

/// Decodes one inline style string from the current store.
///
/// Grammar: `"Display Name[classId]"` where the geometry marker appears in
/// the display text. Returns `None` for a string without a bracket pair in
/// order, with an empty class-id, or without a recognizable marker; a style
/// is never stored with an empty geometry set.
#[must_use]
pub fn decode_current_style(raw: &str) -> Option<(String, StyleInfo)> {
    let open = raw.find('[')?;
    let close = raw.find(']')?;
    if close <= open + 1 {
        return None;
    }
    let geometry: GeometrySet = if raw.contains(SIGN_MARKER) {
        [GeometryType::Point].into()
    } else if raw.contains(OUTLINE_MARKER) {
        [GeometryType::Line, GeometryType::Polygon].into()
    } else {
        return None;
    };
    let class_id = raw[open + 1..close].to_string();
    let name = raw[..open].trim().to_string();
    Some((class_id, StyleInfo::new(name, geometry)))
}

/// Decodes a reference QML style document into class-id keyed styles.
///
/// Locates the `<field name="...">` element matching `class_field`, then
/// the `ValueMap` edit widget inside it, and collects every `Option`
/// element carrying both a `value` and a `name` attribute. Every resulting
/// style is tagged with the contributing table's geometry hint. A document
/// missing the expected structure, or malformed XML, yields an empty map.
#[must_use]
pub fn decode_reference_style(
    qml: &str,
    hint: GeometryType,
    class_field: &str,
) -> BTreeMap<String, StyleInfo> {
    let mut reader = Reader::from_str(qml);
    reader.config_mut().trim_text(true);

    let mut styles = BTreeMap::new();
    let mut in_class_field = false;
    let mut in_value_map = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"field" => {
                        in_class_field = attribute(&e, "name").as_deref() == Some(class_field);
                        in_value_map = false;
                    }
                    b"editWidget" if in_class_field => {
                        if attribute(&e, "type").as_deref() == Some("ValueMap") {
                            in_value_map = true;
                        }
                    }
                    b"Option" if in_class_field && in_value_map => {
                        collect_option(&e, hint, &mut styles);
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"Option" && in_class_field && in_value_map {
                    collect_option(&e, hint, &mut styles);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"field" => {
                    in_class_field = false;
                    in_value_map = false;
                }
                b"editWidget" => in_value_map = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                warn!("malformed style document: {err}");
                return BTreeMap::new();
            }
            Ok(_) => {}
        }
    }

    styles
}

/// Records one enumeration option as a style entry.
///
/// Options missing either attribute (such as the enclosing `Map` container
/// option) are ignored; a recurring value is overwritten last-wins, as a
/// single document never legitimately repeats a class-id.
fn collect_option(e: &BytesStart<'_>, hint: GeometryType, styles: &mut BTreeMap<String, StyleInfo>) {
    let (Some(value), Some(name)) = (attribute(e, "value"), attribute(e, "name")) else {
        return;
    };
    styles.insert(value, StyleInfo::new(name, [hint].into()));
}

/// Returns an attribute's unescaped value, if present.
fn attribute(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key.as_bytes())
        .and_then(|attr| attr.unescape_value().ok().map(|value| value.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryType::{Line, Point, Polygon};

    const ROADS_QML: &str = r#"
        <qgis version="3.34">
          <fieldConfiguration>
            <field name="NAME">
              <editWidget type="TextEdit"/>
            </field>
            <field name="CLASSID">
              <editWidget type="ValueMap">
                <config>
                  <Option type="Map">
                    <Option value="1" name="Paved" type="QString"/>
                    <Option value="2" name="Dirt" type="QString"/>
                  </Option>
                </config>
              </editWidget>
            </field>
          </fieldConfiguration>
        </qgis>"#;

    #[test]
    fn test_decode_current_style_sign() {
        let (class_id, style) = decode_current_style("Мост Знак[12]").unwrap();
        assert_eq!(class_id, "12");
        assert_eq!(style.name, "Мост Знак");
        assert_eq!(style.geometry, [Point].into());
    }

    #[test]
    fn test_decode_current_style_outline() {
        let (class_id, style) = decode_current_style("Дорога Контур[7]").unwrap();
        assert_eq!(class_id, "7");
        assert_eq!(style.geometry, [Line, Polygon].into());
    }

    #[test]
    fn test_decode_current_style_rejects_missing_brackets() {
        assert!(decode_current_style("Дорога Знак").is_none());
        assert!(decode_current_style("Дорога Знак[7").is_none());
        assert!(decode_current_style("Дорога Знак 7]").is_none());
    }

    #[test]
    fn test_decode_current_style_rejects_reversed_or_empty_brackets() {
        assert!(decode_current_style("Дорога ]7[ Знак").is_none());
        assert!(decode_current_style("Дорога Знак[]").is_none());
    }

    #[test]
    fn test_decode_current_style_rejects_missing_marker() {
        assert!(decode_current_style("Дорога[7]").is_none());
    }

    #[test]
    fn test_decode_reference_style() {
        let styles = decode_reference_style(ROADS_QML, Line, "CLASSID");
        assert_eq!(styles.len(), 2);
        assert_eq!(styles["1"].name, "Paved");
        assert_eq!(styles["1"].geometry, [Line].into());
        assert_eq!(styles["2"].name, "Dirt");
    }

    #[test]
    fn test_decode_reference_style_ignores_other_fields() {
        // The TextEdit widget under NAME must not leak options, and the
        // Map container option (no value attribute) is skipped.
        let styles = decode_reference_style(ROADS_QML, Polygon, "CLASSID");
        assert!(!styles.contains_key(""));
        assert_eq!(styles.len(), 2);
    }

    #[test]
    fn test_decode_reference_style_missing_class_field() {
        let styles = decode_reference_style(ROADS_QML, Line, "STYLECODE");
        assert!(styles.is_empty());
    }

    #[test]
    fn test_decode_reference_style_malformed_document() {
        let styles = decode_reference_style("<qgis><field name=", Line, "CLASSID");
        assert!(styles.is_empty());
    }

    #[test]
    fn test_decode_reference_style_empty_document() {
        let styles = decode_reference_style("", Line, "CLASSID");
        assert!(styles.is_empty());
    }
}
