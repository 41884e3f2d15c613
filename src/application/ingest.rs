//! Flat-record ingestion: input document → ordered `FlatRecord` list
//!
//! Two input formats are understood:
//! - XML, the native employee export:
//!   `<employees><employee><field id="email">…</field><field id="manager">…</field></employee></employees>`
//! - JSON, an array of objects: `[{"email": "…", "manager": "…"}]`
//!
//! A record lacking its identity is reported and skipped. A missing, empty or
//! `null` manager marks the record as a root candidate.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::FlatRecord;

/// Input document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Choose by file extension (`.json` is JSON, anything else XML)
    #[default]
    Auto,
    Xml,
    Json,
}

impl InputFormat {
    /// Resolve `Auto` against the source path.
    pub fn resolve(self, origin: &Path) -> Self {
        match self {
            InputFormat::Auto => match origin.extension().and_then(|e| e.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
                _ => InputFormat::Xml,
            },
            other => other,
        }
    }
}

/// Element and field names used to locate records in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    /// XML element wrapping one employee
    pub record_tag: String,
    /// XML element holding one field, named by its `id` attribute
    pub field_tag: String,
    /// Field carrying the identity (mandatory)
    pub identity_field: String,
    /// Field carrying the manager's identity
    pub parent_field: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            record_tag: "employee".into(),
            field_tag: "field".into(),
            identity_field: "email".into(),
            parent_field: "manager".into(),
        }
    }
}

/// Records read from one document, plus per-record problems.
#[derive(Debug, Default)]
pub struct Ingested {
    pub records: Vec<FlatRecord>,
    pub issues: Vec<ApplicationError>,
}

/// Parses raw input into flat records.
#[derive(Debug, Clone, Default)]
pub struct Ingestor {
    format: InputFormat,
    fields: FieldNames,
}

impl Ingestor {
    pub fn new(format: InputFormat, fields: FieldNames) -> Self {
        Self { format, fields }
    }

    /// Parse `raw`, read from `origin`.
    ///
    /// # Errors
    ///
    /// `SourceUnreadable` if the document itself is malformed. Problems with a
    /// single record end up in `Ingested::issues` instead.
    #[instrument(level = "debug", skip(self, raw))]
    pub fn parse(&self, raw: &str, origin: &Path) -> ApplicationResult<Ingested> {
        let ingested = match self.format.resolve(origin) {
            InputFormat::Json => self.parse_json(raw, origin)?,
            _ => self.parse_xml(raw, origin)?,
        };
        debug!(
            "parsed {} records, {} skipped",
            ingested.records.len(),
            ingested.issues.len()
        );
        Ok(ingested)
    }

    fn parse_xml(&self, raw: &str, origin: &Path) -> ApplicationResult<Ingested> {
        let malformed = |reason: String| ApplicationError::SourceUnreadable {
            path: origin.to_path_buf(),
            reason,
        };

        let mut reader = Reader::from_str(raw);
        reader.config_mut().trim_text(true);

        let mut out = Ingested::default();
        let mut depth = 0usize;
        let mut seen_root = false;
        let mut position = 0usize;
        let mut current: Option<PartialRecord> = None;
        let mut capture: Option<Slot> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| malformed(format!("at byte {}: {}", reader.buffer_position(), e)))?;
            match event {
                Event::Start(e) => {
                    if depth == 0 {
                        seen_root = true;
                    }
                    if depth == 1 && e.name().as_ref() == self.fields.record_tag.as_bytes() {
                        current = Some(PartialRecord::default());
                    } else if depth == 2 && e.name().as_ref() == self.fields.field_tag.as_bytes() {
                        if let Some(record) = current.as_mut() {
                            capture = self.open_field(&e, record).map_err(malformed)?;
                        }
                    }
                    depth += 1;
                }
                Event::Empty(e) => {
                    if depth == 0 {
                        seen_root = true;
                    } else if depth == 1 && e.name().as_ref() == self.fields.record_tag.as_bytes() {
                        self.finish(PartialRecord::default(), position, &mut out);
                        position += 1;
                    } else if depth == 2 && e.name().as_ref() == self.fields.field_tag.as_bytes() {
                        if let Some(record) = current.as_mut() {
                            // `<field id="manager"/>`: present but empty
                            self.open_field(&e, record).map_err(malformed)?;
                        }
                    }
                }
                Event::Text(t) => {
                    if let (Some(slot), Some(record)) = (capture, current.as_mut()) {
                        let text = t.unescape().map_err(|e| malformed(e.to_string()))?;
                        record.slot_mut(slot).push_str(&text);
                    }
                }
                Event::CData(c) => {
                    if let (Some(slot), Some(record)) = (capture, current.as_mut()) {
                        record
                            .slot_mut(slot)
                            .push_str(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                Event::End(e) => {
                    depth = depth.saturating_sub(1);
                    if depth == 2 && e.name().as_ref() == self.fields.field_tag.as_bytes() {
                        capture = None;
                    } else if depth == 1 && e.name().as_ref() == self.fields.record_tag.as_bytes() {
                        if let Some(record) = current.take() {
                            self.finish(record, position, &mut out);
                            position += 1;
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !seen_root {
            return Err(malformed("document has no root element".into()));
        }
        if depth != 0 {
            return Err(malformed("unexpected end of document".into()));
        }
        Ok(out)
    }

    /// Start capturing a field if its `id` is one we care about.
    ///
    /// The first occurrence of each field wins; repeats are ignored.
    fn open_field(
        &self,
        e: &BytesStart<'_>,
        record: &mut PartialRecord,
    ) -> Result<Option<Slot>, String> {
        let mut id = None;
        for attr in e.attributes() {
            let attr = attr.map_err(|err| err.to_string())?;
            if attr.key.as_ref() == b"id" {
                id = Some(attr.unescape_value().map_err(|err| err.to_string())?.into_owned());
            }
        }
        let slot = match id.as_deref() {
            Some(id) if id == self.fields.identity_field => Slot::Identity,
            Some(id) if id == self.fields.parent_field => Slot::Parent,
            _ => return Ok(None),
        };
        let target = match slot {
            Slot::Identity => &mut record.identity,
            Slot::Parent => &mut record.parent,
        };
        if target.is_some() {
            return Ok(None);
        }
        *target = Some(String::new());
        Ok(Some(slot))
    }

    fn parse_json(&self, raw: &str, origin: &Path) -> ApplicationResult<Ingested> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| ApplicationError::SourceUnreadable {
                path: origin.to_path_buf(),
                reason: e.to_string(),
            })?;
        let entries = value
            .as_array()
            .ok_or_else(|| ApplicationError::SourceUnreadable {
                path: origin.to_path_buf(),
                reason: "expected an array of employee records".into(),
            })?;

        let mut out = Ingested::default();
        for (position, entry) in entries.iter().enumerate() {
            let text = |field: &str| {
                entry
                    .get(field)
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            };
            let record = PartialRecord {
                identity: text(self.fields.identity_field.as_str()),
                parent: text(self.fields.parent_field.as_str()),
            };
            self.finish(record, position, &mut out);
        }
        Ok(out)
    }

    fn finish(&self, record: PartialRecord, position: usize, out: &mut Ingested) {
        match record.identity.filter(|id| !id.trim().is_empty()) {
            Some(identity) => out.records.push(FlatRecord::new(identity, record.parent)),
            None => {
                warn!("record {} has no {}", position, self.fields.identity_field);
                out.issues.push(ApplicationError::MissingIdentity {
                    position,
                    field: self.fields.identity_field.clone(),
                });
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Identity,
    Parent,
}

#[derive(Debug, Default)]
struct PartialRecord {
    identity: Option<String>,
    parent: Option<String>,
}

impl PartialRecord {
    fn slot_mut(&mut self, slot: Slot) -> &mut String {
        let target = match slot {
            Slot::Identity => &mut self.identity,
            Slot::Parent => &mut self.parent,
        };
        target.get_or_insert_with(String::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn xml() -> Ingestor {
        Ingestor::new(InputFormat::Xml, FieldNames::default())
    }

    fn origin() -> PathBuf {
        PathBuf::from("employees.xml")
    }

    #[test]
    fn given_auto_format_when_resolving_then_uses_extension() {
        assert_eq!(
            InputFormat::Auto.resolve(Path::new("a/b.JSON")),
            InputFormat::Json
        );
        assert_eq!(
            InputFormat::Auto.resolve(Path::new("a/b.xml")),
            InputFormat::Xml
        );
        assert_eq!(InputFormat::Auto.resolve(Path::new("noext")), InputFormat::Xml);
        assert_eq!(
            InputFormat::Json.resolve(Path::new("b.xml")),
            InputFormat::Json
        );
    }

    #[test]
    fn given_escaped_text_when_parsing_xml_then_unescapes() {
        let raw = r#"<employees>
            <employee><field id="email">r&amp;d@corp.com</field></employee>
        </employees>"#;
        let out = xml().parse(raw, &origin()).unwrap();
        assert_eq!(out.records[0].identity(), "r&d@corp.com");
    }

    #[test]
    fn given_cdata_when_parsing_xml_then_keeps_content() {
        let raw = r#"<employees>
            <employee><field id="email"><![CDATA[ceo@corp.com]]></field></employee>
        </employees>"#;
        let out = xml().parse(raw, &origin()).unwrap();
        assert_eq!(out.records[0].identity(), "ceo@corp.com");
    }

    #[test]
    fn given_repeated_field_when_parsing_xml_then_first_wins() {
        let raw = r#"<employees><employee>
            <field id="email">first@corp.com</field>
            <field id="email">second@corp.com</field>
        </employee></employees>"#;
        let out = xml().parse(raw, &origin()).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].identity(), "first@corp.com");
    }

    #[test]
    fn given_nested_employee_tags_when_parsing_xml_then_only_direct_children_count() {
        let raw = r#"<employees>
            <group><employee><field id="email">hidden@corp.com</field></employee></group>
            <employee><field id="email">ceo@corp.com</field></employee>
        </employees>"#;
        let out = xml().parse(raw, &origin()).unwrap();
        let ids: Vec<_> = out.records.iter().map(|r| r.identity()).collect();
        assert_eq!(ids, vec!["ceo@corp.com"]);
    }

    #[test]
    fn given_empty_document_when_parsing_xml_then_unreadable() {
        let err = xml().parse("", &origin()).unwrap_err();
        assert!(matches!(err, ApplicationError::SourceUnreadable { .. }));
    }

    #[test]
    fn given_non_array_json_when_parsing_then_unreadable() {
        let ingestor = Ingestor::new(InputFormat::Json, FieldNames::default());
        let err = ingestor
            .parse(r#"{"email": "a"}"#, Path::new("x.json"))
            .unwrap_err();
        assert!(matches!(err, ApplicationError::SourceUnreadable { .. }));
    }
}
