//! First-level splitter for `FeatureCollection` documents.
//!
//! The splitter pulls events from an [`actson`] parser, walks the top-level
//! object member by member and rebuilds each element of the `features` array
//! as a [`JsonValue`]. Only the element currently being rebuilt is held in
//! memory; sibling members are validated by the parser and discarded.

use std::io::{self, BufReader, Read};

use actson::feeder::{BufReaderJsonFeeder, FillError, JsonFeeder};
use actson::parser::ParserError;
use actson::{JsonEvent, JsonParser};
use geojson::JsonValue;
use geolegacy_core_common::{ReadError, ReadResult, SourcePosition};
use serde_json::{Map, Number};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Members,
    Features,
    Finished,
}

/// One element of the `features` array.
#[derive(Debug, Clone)]
pub struct RawFeature {
    pub value: JsonValue,
    /// Where the element starts, with `record` set to its 1-based index
    pub position: SourcePosition,
}

/// Feeds the parser from a buffered reader and counts the lines it has seen.
struct LineFeeder<R> {
    inner: BufReaderJsonFeeder<SkipBom<R>>,
    line: u64,
}

impl<R: Read> LineFeeder<R> {
    fn fill(&mut self) -> ReadResult<()> {
        self.inner.fill_buf().map_err(|err| match err {
            FillError::Io(source) => io_error(source),
        })
    }
}

impl<R: Read> JsonFeeder for LineFeeder<R> {
    fn has_input(&self) -> bool {
        self.inner.has_input()
    }

    fn is_done(&self) -> bool {
        self.inner.is_done()
    }

    fn next_input(&mut self) -> Option<u8> {
        let byte = self.inner.next_input();
        if byte == Some(b'\n') {
            self.line += 1;
        }
        byte
    }
}

/// Drops a leading UTF-8 byte order mark.
struct SkipBom<R> {
    inner: R,
    head: [u8; 3],
    head_len: usize,
    head_pos: usize,
    checked: bool,
}

impl<R> SkipBom<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            head: [0; 3],
            head_len: 0,
            head_pos: 0,
            checked: false,
        }
    }
}

impl<R: Read> Read for SkipBom<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.checked {
            while self.head_len < UTF8_BOM.len() {
                let n = self.inner.read(&mut self.head[self.head_len..])?;
                if n == 0 {
                    break;
                }
                self.head_len += n;
            }
            self.checked = true;
            if self.head[..self.head_len] == UTF8_BOM {
                self.head_pos = self.head_len;
            }
        }
        if self.head_pos < self.head_len {
            let n = (self.head_len - self.head_pos).min(buf.len());
            buf[..n].copy_from_slice(&self.head[self.head_pos..self.head_pos + n]);
            self.head_pos += n;
            return Ok(n);
        }
        self.inner.read(buf)
    }
}

/// Streaming splitter over a `{"type":"FeatureCollection","features":[...]}`
/// document.
///
/// Byte offsets are counted after a leading byte order mark, if any.
pub struct FeatureSplitter<R> {
    parser: JsonParser<LineFeeder<R>>,
    state: State,
    seen_features: bool,
    records: u64,
}

impl<R: Read> FeatureSplitter<R> {
    pub fn new(reader: R) -> Self {
        let feeder = LineFeeder {
            inner: BufReaderJsonFeeder::new(BufReader::new(SkipBom::new(reader))),
            line: 1,
        };
        Self {
            parser: JsonParser::new(feeder),
            state: State::Start,
            seen_features: false,
            records: 0,
        }
    }

    /// Number of features produced so far.
    #[must_use]
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Position of the last byte handed to the parser.
    #[must_use]
    pub fn position(&self) -> SourcePosition {
        SourcePosition {
            line: Some(self.parser.feeder.line),
            byte_offset: Some(self.parser.parsed_bytes() as u64),
            record: None,
        }
    }

    /// Returns the next feature, `None` once the document is complete.
    ///
    /// The splitter is fused: after the first error every call returns
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Parse`] when the document is not valid JSON or does
    /// not have the expected shape, and [`ReadError::Io`] when the reader
    /// fails.
    pub fn next_chunk(&mut self) -> ReadResult<Option<RawFeature>> {
        let result = self.advance();
        if result.is_err() {
            self.state = State::Finished;
        }
        result
    }

    fn advance(&mut self) -> ReadResult<Option<RawFeature>> {
        loop {
            match self.state {
                State::Start => match self.next_event()? {
                    Some(JsonEvent::StartObject) => self.state = State::Members,
                    _ => return Err(self.error("expected a FeatureCollection object")),
                },
                State::Members => match self.next_event()? {
                    Some(JsonEvent::FieldName) => {
                        let key = self.current_str()?;
                        self.member(&key)?;
                    },
                    Some(JsonEvent::EndObject) => {
                        self.finish_document()?;
                        self.state = State::Finished;
                        return Ok(None);
                    },
                    _ => return Err(self.error("expected an object key or '}'")),
                },
                State::Features => {
                    let event = self.require_event()?;
                    if event == JsonEvent::EndArray {
                        self.state = State::Members;
                        continue;
                    }
                    self.records += 1;
                    let mut position = self.position();
                    position.byte_offset = position.byte_offset.map(|offset| offset.saturating_sub(1));
                    position.record = Some(self.records);
                    let value = self.read_value(event)?;
                    return Ok(Some(RawFeature { value, position }));
                },
                State::Finished => return Ok(None),
            }
        }
    }

    /// Handles the value of one top-level member.
    fn member(&mut self, key: &str) -> ReadResult<()> {
        match key {
            "features" => {
                if self.seen_features {
                    return Err(self.error("duplicate 'features' member"));
                }
                self.seen_features = true;
                if self.require_event()? != JsonEvent::StartArray {
                    return Err(self.error("expected the 'features' array"));
                }
                self.state = State::Features;
            },
            "type" => {
                let event = self.require_event()?;
                if event != JsonEvent::ValueString {
                    return Err(self.error("invalid 'type' member: expected a string"));
                }
                let kind = self.current_str()?;
                if kind != "FeatureCollection" {
                    return Err(self.error(format!(
                        "expected a FeatureCollection, found type '{kind}'"
                    )));
                }
            },
            _ => {
                let event = self.require_event()?;
                self.skip_value(event)?;
            },
        }
        Ok(())
    }

    fn finish_document(&mut self) -> ReadResult<()> {
        if self.next_event()?.is_some() {
            return Err(self.error("expected the end of the document"));
        }
        if !self.seen_features {
            return Err(self.error("missing 'features' array"));
        }
        Ok(())
    }

    /// Rebuilds the value starting with `first`.
    fn read_value(&mut self, first: JsonEvent) -> ReadResult<JsonValue> {
        let mut stack: Vec<(Option<String>, JsonValue)> = Vec::new();
        let mut key: Option<String> = None;
        let mut event = first;
        loop {
            let finished = match event {
                JsonEvent::StartObject => {
                    stack.push((key.take(), JsonValue::Object(Map::new())));
                    None
                },
                JsonEvent::StartArray => {
                    stack.push((key.take(), JsonValue::Array(Vec::new())));
                    None
                },
                JsonEvent::FieldName => {
                    key = Some(self.current_str()?);
                    None
                },
                JsonEvent::EndObject | JsonEvent::EndArray => {
                    let (parent_key, value) = stack
                        .pop()
                        .ok_or_else(|| self.error("unbalanced JSON value"))?;
                    key = parent_key;
                    Some(value)
                },
                scalar => Some(self.scalar(scalar)?),
            };

            if let Some(value) = finished {
                match stack.last_mut() {
                    None => return Ok(value),
                    Some((_, JsonValue::Object(map))) => {
                        let name = key
                            .take()
                            .ok_or_else(|| self.error("object member without a key"))?;
                        map.insert(name, value);
                    },
                    Some((_, JsonValue::Array(items))) => items.push(value),
                    Some(_) => return Err(self.error("unbalanced JSON value")),
                }
            }
            event = self.require_event()?;
        }
    }

    fn skip_value(&mut self, first: JsonEvent) -> ReadResult<()> {
        let mut depth = 0usize;
        let mut event = first;
        loop {
            match event {
                JsonEvent::StartObject | JsonEvent::StartArray => depth += 1,
                JsonEvent::EndObject | JsonEvent::EndArray => depth = depth.saturating_sub(1),
                _ => {},
            }
            if depth == 0 {
                return Ok(());
            }
            event = self.require_event()?;
        }
    }

    fn scalar(&self, event: JsonEvent) -> ReadResult<JsonValue> {
        Ok(match event {
            JsonEvent::ValueString => JsonValue::String(self.current_str()?),
            JsonEvent::ValueInt => {
                if let Ok(n) = self.parser.current_int::<i64>() {
                    JsonValue::from(n)
                } else if let Ok(n) = self.parser.current_int::<u64>() {
                    JsonValue::from(n)
                } else {
                    self.float()?
                }
            },
            JsonEvent::ValueFloat => self.float()?,
            JsonEvent::ValueTrue => JsonValue::Bool(true),
            JsonEvent::ValueFalse => JsonValue::Bool(false),
            JsonEvent::ValueNull => JsonValue::Null,
            _ => return Err(self.error("expected a JSON value")),
        })
    }

    fn float(&self) -> ReadResult<JsonValue> {
        let number = self
            .parser
            .current_float()
            .map_err(|err| self.error(format!("invalid number: {err}")))?;
        Number::from_f64(number)
            .map(JsonValue::Number)
            .ok_or_else(|| self.error(format!("number out of range: {number}")))
    }

    fn current_str(&self) -> ReadResult<String> {
        self.parser
            .current_str()
            .map(str::to_string)
            .map_err(|err| self.error(err.to_string()))
    }

    /// Next parser event, refilling the feeder as needed. `None` marks the end
    /// of a complete document.
    fn next_event(&mut self) -> ReadResult<Option<JsonEvent>> {
        loop {
            match self.parser.next_event() {
                Ok(Some(JsonEvent::NeedMoreInput)) => self.parser.feeder.fill()?,
                Ok(event) => return Ok(event),
                Err(ParserError::NoMoreInput) => {
                    return Err(self.error("unexpected end of input"));
                },
                Err(err) => return Err(self.error(format!("invalid JSON: {err}"))),
            }
        }
    }

    fn require_event(&mut self) -> ReadResult<JsonEvent> {
        self.next_event()?
            .ok_or_else(|| self.error("unexpected end of input"))
    }

    fn error(&self, message: impl Into<String>) -> ReadError {
        ReadError::parse(message, self.position())
    }
}

fn io_error(source: io::Error) -> ReadError {
    ReadError::Io {
        context: "GeoJSON input".to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn split(data: &[u8]) -> ReadResult<Vec<JsonValue>> {
        let mut splitter = FeatureSplitter::new(data);
        let mut values = Vec::new();
        while let Some(chunk) = splitter.next_chunk()? {
            values.push(chunk.value);
        }
        Ok(values)
    }

    fn parse_message(err: ReadError) -> String {
        match err {
            ReadError::Parse { message, .. } => message,
            ReadError::Io { .. } => panic!("Expected Parse error"),
        }
    }

    #[test]
    fn splits_feature_array() {
        let data = br#"{"type":"FeatureCollection","features":[{"a":1}, {"b":"}]"} ,{"c":[1,[2.5,null]]}]}"#;
        let values = split(data).expect("split");
        assert_eq!(
            values,
            vec![json!({"a": 1}), json!({"b": "}]"}), json!({"c": [1, [2.5, null]]})]
        );
    }

    #[test]
    fn tolerates_members_in_any_order() {
        let data = br#"
        {
          "features": [ {"x": "a\"b"} ],
          "name": "layer",
          "crs": {"type": "name", "properties": {"name": "EPSG:4326"}},
          "type": "FeatureCollection"
        }
        "#;
        let values = split(data).expect("split");
        assert_eq!(values, vec![json!({"x": "a\"b"})]);
    }

    #[test]
    fn keeps_member_order_and_large_numbers() {
        let data = br#"{"features":[{"z":1,"a":18446744073709551615,"m":-3,"f":true}]}"#;
        let values = split(data).expect("split");
        let object = values[0].as_object().unwrap();
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["z", "a", "m", "f"]);
        assert_eq!(object["a"], json!(u64::MAX));
        assert_eq!(object["m"], json!(-3));
    }

    #[test]
    fn empty_feature_array() {
        let values = split(br#"{"type":"FeatureCollection","features":[]}"#).expect("split");
        assert!(values.is_empty());
    }

    #[test]
    fn skips_byte_order_mark() {
        let mut data = UTF8_BOM.to_vec();
        data.extend_from_slice(br#"{"features":[{}]}"#);
        assert_eq!(split(&data).expect("split").len(), 1);
    }

    #[test]
    fn rejects_other_geojson_types() {
        let err = split(br#"{"type":"Invalid","features":[]}"#).unwrap_err();
        assert!(parse_message(err).contains("expected a FeatureCollection"));
    }

    #[test]
    fn rejects_missing_features() {
        let err = split(br#"{"type":"FeatureCollection"}"#).unwrap_err();
        assert!(parse_message(err).contains("missing 'features' array"));
    }

    #[test]
    fn rejects_features_that_are_not_an_array() {
        let err = split(br#"{"features":{}}"#).unwrap_err();
        assert!(parse_message(err).contains("the 'features' array"));
    }

    #[test]
    fn rejects_duplicate_features() {
        let err = split(br#"{"features":[],"features":[]}"#).unwrap_err();
        assert!(parse_message(err).contains("duplicate"));
    }

    #[test]
    fn rejects_invalid_json() {
        for data in [
            &br#"{"features":[]} extra"#[..],
            br#"{"features":[{},]}"#,
            br#"{"features":[],"name":tru}"#,
            b"not valid json at all",
        ] {
            let err = split(data).unwrap_err();
            assert!(err.is_malformed_input(), "{}", String::from_utf8_lossy(data));
        }
    }

    #[test]
    fn rejects_non_object_documents() {
        let err = split(b"[1, 2]").unwrap_err();
        assert!(parse_message(err).contains("a FeatureCollection object"));

        let err = split(b"").unwrap_err();
        assert!(parse_message(err).contains("unexpected end of input"));
    }

    #[test]
    fn errors_are_lazy_and_fused() {
        let data = br#"{"features":[{"id":1},{"id":2}"#;
        let mut splitter = FeatureSplitter::new(&data[..]);

        assert!(splitter.next_chunk().unwrap().is_some());
        assert!(splitter.next_chunk().unwrap().is_some());
        assert!(splitter.next_chunk().is_err());
        assert!(splitter.next_chunk().unwrap().is_none());
    }

    #[test]
    fn chunk_positions_track_lines_and_records() {
        let data = b"{\"features\":[\n{\"id\":1},\n{\"id\":2}\n]}";
        let mut splitter = FeatureSplitter::new(&data[..]);

        let first = splitter.next_chunk().unwrap().unwrap();
        assert_eq!(first.position.line, Some(2));
        assert_eq!(first.position.byte_offset, Some(14));
        assert_eq!(first.position.record, Some(1));

        let second = splitter.next_chunk().unwrap().unwrap();
        assert_eq!(second.position.line, Some(3));
        assert_eq!(second.position.record, Some(2));
        assert_eq!(splitter.records(), 2);
    }
}
