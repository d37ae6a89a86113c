//! Event log codec
//!
//! Each record is a JSON object `{"type": <tag>, "event": <payload>}`
//! followed by a newline. Records are read back-to-back from the byte
//! stream by structural parsing; the newline is not required.
//!
//! The decoder reads `type` before `event` so it knows the payload shape
//! before parsing it, without buffering the record.

use std::fmt;
use std::io::{Read, Write};

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::de::IoRead;
use serde_json::StreamDeserializer;

use super::error::CodecError;
use crate::event::{Event, TAG_ADD, TAG_CHANGE, TAG_IO_ERROR, TAG_REMOVE};

const TAGS: &[&str] = &[TAG_ADD, TAG_REMOVE, TAG_CHANGE];
const KEYS: &[&str] = &["type", "event"];

#[derive(Serialize)]
struct RecordRef<'a, T: Serialize> {
    #[serde(rename = "type")]
    kind: &'static str,
    event: &'a T,
}

/// Write one record for `event`
pub fn encode<W: Write>(mut writer: W, event: &Event) -> Result<(), CodecError> {
    let kind = event.type_tag();
    match event {
        Event::ItemAdded(e) => serde_json::to_writer(&mut writer, &RecordRef { kind, event: e })?,
        Event::ItemRemoved(e) => {
            serde_json::to_writer(&mut writer, &RecordRef { kind, event: e })?
        }
        Event::ItemChanged(e) => {
            serde_json::to_writer(&mut writer, &RecordRef { kind, event: e })?
        }
        Event::IoError(_) => return Err(CodecError::UnsupportedType(TAG_IO_ERROR)),
    }
    writer.write_all(b"\n")?;
    Ok(())
}

/// Encode one record into a fresh buffer
pub fn encode_to_vec(event: &Event) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(128);
    encode(&mut buf, event)?;
    Ok(buf)
}

/// A decoded record
struct Record(Event);

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RecordVisitor).map(Record)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Event;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an event record object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Event, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut tag: Option<String> = None;
        let mut event = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "type" => tag = Some(map.next_value()?),
                "event" => {
                    let Some(tag) = tag.as_deref() else {
                        return Err(de::Error::custom("key \"type\" must precede \"event\""));
                    };
                    event = Some(match tag {
                        TAG_ADD => Event::ItemAdded(map.next_value()?),
                        TAG_REMOVE => Event::ItemRemoved(map.next_value()?),
                        TAG_CHANGE => Event::ItemChanged(map.next_value()?),
                        other => return Err(de::Error::unknown_variant(other, TAGS)),
                    });
                }
                other => return Err(de::Error::unknown_field(other, KEYS)),
            }
        }

        event.ok_or_else(|| de::Error::missing_field("event"))
    }
}

/// Sequential reader over a stream of records
pub struct LogReader<R: Read> {
    records: StreamDeserializer<'static, IoRead<R>, Record>,
}

impl<R: Read> LogReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            records: serde_json::Deserializer::from_reader(reader).into_iter(),
        }
    }

    /// Byte offset just past the last record decoded successfully
    pub fn offset(&self) -> usize {
        self.records.byte_offset()
    }
}

impl<R: Read> Iterator for LogReader<R> {
    type Item = Result<Event, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records
            .next()
            .map(|r| r.map(|Record(event)| event).map_err(CodecError::from))
    }
}

/// Outcome of decoding a whole log
#[derive(Debug)]
pub struct Decoded {
    /// Events decoded before the end or the first failure
    pub events: Vec<Event>,
    /// The failure that stopped decoding, with the offset of the bad record
    pub error: Option<(usize, CodecError)>,
}

/// Decode every record in `bytes`, stopping at the first failure
pub fn read_all(bytes: &[u8]) -> Decoded {
    let mut reader = LogReader::new(bytes);
    let mut events = Vec::new();
    loop {
        let offset = reader.offset();
        match reader.next() {
            None => return Decoded { events, error: None },
            Some(Ok(event)) => events.push(event),
            Some(Err(e)) => {
                return Decoded {
                    events,
                    error: Some((offset, e)),
                }
            }
        }
    }
}
