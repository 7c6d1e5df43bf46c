//! Flat comma-separated encoding of one [`PoseFrame`] per line.
//!
//! Field order:
//!
//! ```text
//! bodyRootPosition(3) bodyRootRotation(4) bodyPosition(3) bodyRotation(4)
//! muscles(N) frameIndex(1) time(1) { name(1) localPosition(3) localRotation(4) }*
//! ```
//!
//! Numbers use Rust's locale-independent formatting (period decimal separator,
//! shortest representation that round-trips). Foot IK goals are not part of the
//! line; decoded frames carry identity goals.
//!
//! The format has no version field. Files written with a different muscle
//! taxonomy or field order cannot be read back.

use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::{FieldParseError, FormatError, PoseError};
use crate::frame::{BoneSample, PoseFrame};
use crate::math::{Quat, Vec3};

pub const SEPARATOR: char = ',';

/// Root (3+4) and body (3+4) transform fields before the muscles.
const TRANSFORM_FIELDS: usize = 14;
/// Name + local position + local rotation.
pub const BONE_FIELDS: usize = 8;

/// Encoder/decoder bound to one host muscle taxonomy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CsvPoseCodec {
    muscle_count: usize,
}

impl CsvPoseCodec {
    pub fn new(muscle_count: usize) -> Self {
        Self { muscle_count }
    }

    #[inline]
    pub fn muscle_count(&self) -> usize {
        self.muscle_count
    }

    /// Number of fields before the first bone group.
    #[inline]
    pub fn prefix_len(&self) -> usize {
        TRANSFORM_FIELDS + self.muscle_count + 2
    }

    /// Serialize `frame` into one line (no trailing separator, no newline).
    pub fn encode(&self, frame: &PoseFrame) -> Result<String, PoseError> {
        let mut line = String::with_capacity(16 * (self.prefix_len() + frame.bones.len() * 8));
        self.encode_into(frame, &mut line)?;
        Ok(line)
    }

    /// Append the encoded frame to `out`.
    pub fn encode_into(&self, frame: &PoseFrame, out: &mut String) -> Result<(), PoseError> {
        if frame.muscles.len() != self.muscle_count {
            return Err(PoseError::invalid_argument(format!(
                "frame {} has {} muscles, codec expects {}",
                frame.frame_index,
                frame.muscles.len(),
                self.muscle_count
            )));
        }
        if let Some(bone) = frame
            .bones
            .iter()
            .find(|b| b.name.contains([SEPARATOR, '\n', '\r']))
        {
            return Err(PoseError::invalid_argument(format!(
                "bone name '{}' contains a separator or line break",
                bone.name
            )));
        }

        let mut fields = FieldWriter::new(out);
        fields.floats(&frame.body_root_position);
        fields.floats(&frame.body_root_rotation);
        fields.floats(&frame.body_position);
        fields.floats(&frame.body_rotation);
        fields.floats(&frame.muscles);
        fields.display(frame.frame_index);
        fields.display(frame.time);
        for bone in &frame.bones {
            fields.text(&bone.name);
            fields.floats(&bone.local_position);
            fields.floats(&bone.local_rotation);
        }
        Ok(())
    }

    /// Parse one line into a fresh frame.
    pub fn decode(&self, line: &str) -> Result<PoseFrame, PoseError> {
        let mut frame = PoseFrame::default();
        self.decode_into(line, &mut frame)?;
        Ok(frame)
    }

    /// Parse one line into `target`.
    ///
    /// `target` is only written once the whole line parsed; on error it is left
    /// exactly as it was.
    pub fn decode_into(&self, line: &str, target: &mut PoseFrame) -> Result<(), PoseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split(SEPARATOR).collect();
        let prefix = self.prefix_len();
        if fields.len() < prefix {
            return Err(FormatError::FieldCount {
                expected: prefix,
                found: fields.len(),
            }
            .into());
        }

        let mut reader = FieldReader::new(&fields);
        let body_root_position: Vec3 = reader.array()?;
        let body_root_rotation: Quat = reader.array()?;
        let body_position: Vec3 = reader.array()?;
        let body_rotation: Quat = reader.array()?;
        let mut muscles = Vec::with_capacity(self.muscle_count);
        for _ in 0..self.muscle_count {
            muscles.push(reader.number::<f32>()?);
        }
        let frame_index: u32 = reader.number()?;
        let time: f32 = reader.number()?;

        let mut bones = Vec::with_capacity(reader.remaining() / BONE_FIELDS);
        while reader.remaining() >= BONE_FIELDS {
            let name = reader.text();
            let local_position: Vec3 = reader.array()?;
            let local_rotation: Quat = reader.array()?;
            bones.push(BoneSample {
                name: name.to_string(),
                local_position,
                local_rotation,
            });
        }
        if reader.remaining() > 0 && !reader.rest_is_blank() {
            log::warn!(
                "frame {frame_index}: ignoring {} trailing fields (less than one bone group)",
                reader.remaining()
            );
        }

        *target = PoseFrame {
            frame_index,
            time,
            body_root_position,
            body_root_rotation,
            body_position,
            body_rotation,
            muscles,
            bones,
            ..PoseFrame::default()
        };
        Ok(())
    }
}

struct FieldWriter<'a> {
    out: &'a mut String,
    first: bool,
}

impl<'a> FieldWriter<'a> {
    fn new(out: &'a mut String) -> Self {
        Self { out, first: true }
    }

    fn sep(&mut self) {
        if !self.first {
            self.out.push(SEPARATOR);
        }
        self.first = false;
    }

    fn display(&mut self, value: impl std::fmt::Display) {
        self.sep();
        // Writing into a String cannot fail.
        let _ = write!(self.out, "{value}");
    }

    fn floats(&mut self, values: &[f32]) {
        for v in values {
            self.display(v);
        }
    }

    fn text(&mut self, value: &str) {
        self.sep();
        self.out.push_str(value);
    }
}

struct FieldReader<'a> {
    fields: &'a [&'a str],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn new(fields: &'a [&'a str]) -> Self {
        Self { fields, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.fields.len() - self.pos
    }

    fn rest_is_blank(&self) -> bool {
        self.fields[self.pos..].iter().all(|f| f.trim().is_empty())
    }

    fn text(&mut self) -> &'a str {
        let field = self.fields[self.pos];
        self.pos += 1;
        field
    }

    fn number<T>(&mut self) -> Result<T, FormatError>
    where
        T: FromStr,
        FieldParseError: From<T::Err>,
    {
        let position = self.pos;
        let text = self.text();
        text.trim().parse::<T>().map_err(|e| FormatError::Field {
            position,
            text: text.to_string(),
            source: e.into(),
        })
    }

    fn array<const N: usize>(&mut self) -> Result<[f32; N], FormatError> {
        let mut out = [0.0; N];
        for slot in out.iter_mut() {
            *slot = self.number()?;
        }
        Ok(out)
    }
}
