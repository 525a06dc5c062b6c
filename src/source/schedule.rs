//! Schedule Builder — syntax tree to a validated frame schedule.
//!
//! Expected layout, with any node optionally quoted:
//!
//! ```text
//! (ftl
//!   (frame <int>
//!     (bullet (uid <int>) (position <num> <num>) (direction <num>) (speed <num>))
//!     ...)
//!   ...)
//! ```

use tracing::debug;

use crate::error::FtlError;
use crate::types::{BulletEvent, Schedule};

use super::syntax::SyntaxNode;

/// Recognized keys inside a `bullet` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletFieldKey {
    Uid,
    Position,
    Direction,
    Speed,
    /// Ignored, so newer documents still load.
    Unknown,
}

impl BulletFieldKey {
    pub fn from_symbol(name: &str) -> Self {
        match name {
            "uid" => BulletFieldKey::Uid,
            "position" => BulletFieldKey::Position,
            "direction" => BulletFieldKey::Direction,
            "speed" => BulletFieldKey::Speed,
            _ => BulletFieldKey::Unknown,
        }
    }

    fn arity(self) -> usize {
        match self {
            BulletFieldKey::Position => 2,
            _ => 1,
        }
    }
}

/// Fields collected so far for one `bullet` entry. Repeated keys overwrite.
#[derive(Debug, Default)]
struct BulletEventBuilder {
    uid: Option<i64>,
    position: Option<(f64, f64)>,
    direction_degrees: Option<f64>,
    speed: Option<f64>,
}

impl BulletEventBuilder {
    fn finish(self, location: &str) -> Result<BulletEvent, FtlError> {
        let missing: Vec<&str> = [
            ("uid", self.uid.is_none()),
            ("position", self.position.is_none()),
            ("direction", self.direction_degrees.is_none()),
            ("speed", self.speed.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match (self.uid, self.position, self.direction_degrees, self.speed) {
            (Some(uid), Some(position), Some(direction_degrees), Some(speed)) => Ok(BulletEvent {
                uid,
                position,
                direction_degrees,
                speed,
            }),
            _ => Err(FtlError::shape(
                location,
                format!("bullet is missing {}", missing.join(", ")),
            )),
        }
    }
}

/// Walk a parsed document into a [`Schedule`].
///
/// Frame numbers may appear in any order; a repeated frame number replaces
/// the earlier block's events.
pub fn build(doc: &SyntaxNode) -> Result<Schedule, FtlError> {
    let items = doc.as_list().ok_or_else(|| {
        FtlError::shape(
            "document",
            format!("expected a list starting with `ftl`, found {}", doc.kind()),
        )
    })?;
    match items.first() {
        Some(tag) if tag.is_symbol("ftl") => {}
        _ => {
            return Err(FtlError::shape(
                "document",
                "expected a list starting with `ftl`",
            ));
        }
    }

    let mut schedule = Schedule::default();
    for (index, frame_expr) in items[1..].iter().enumerate() {
        let (frame, events) = build_frame(index, frame_expr)?;
        if schedule.insert(frame, events).is_some() {
            debug!(frame, "frame number repeated; later block replaces earlier");
        }
    }

    debug!(
        frames = schedule.frame_count(),
        events = schedule.event_count(),
        last_frame = schedule.last_frame(),
        "schedule built"
    );
    Ok(schedule)
}

fn build_frame(index: usize, expr: &SyntaxNode) -> Result<(u64, Vec<BulletEvent>), FtlError> {
    let location = format!("frame #{index}");
    let items = expr.as_list().ok_or_else(|| {
        FtlError::shape(
            &location,
            format!("expected a `frame` list, found {}", expr.kind()),
        )
    })?;
    match items.first() {
        Some(tag) if tag.is_symbol("frame") => {}
        _ => return Err(FtlError::shape(&location, "expected a list starting with `frame`")),
    }

    let frame = match items.get(1).map(SyntaxNode::unquoted) {
        Some(SyntaxNode::Int(n)) if *n >= 0 => *n as u64,
        Some(other) => {
            return Err(FtlError::shape(
                &location,
                format!(
                    "frame number must be a non-negative integer, found {}",
                    describe(other)
                ),
            ));
        }
        None => return Err(FtlError::shape(&location, "frame number is missing")),
    };

    let location = format!("{location} (frame {frame})");
    let events = items[2..]
        .iter()
        .enumerate()
        .map(|(bullet_index, bullet)| {
            build_bullet(&format!("{location} > bullet #{bullet_index}"), bullet)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((frame, events))
}

fn build_bullet(location: &str, expr: &SyntaxNode) -> Result<BulletEvent, FtlError> {
    let items = expr.as_list().ok_or_else(|| {
        FtlError::shape(
            location,
            format!("expected a `bullet` list, found {}", expr.kind()),
        )
    })?;
    match items.first() {
        Some(tag) if tag.is_symbol("bullet") => {}
        _ => return Err(FtlError::shape(location, "expected a list starting with `bullet`")),
    }

    let mut builder = BulletEventBuilder::default();
    for part in &items[1..] {
        let Some((name, values)) = part.as_list().and_then(|p| {
            let (key, values) = p.split_first()?;
            Some((key.as_symbol()?, values))
        }) else {
            return Err(FtlError::shape(
                location,
                format!("expected a `(key value...)` entry, found {}", part.kind()),
            ));
        };

        let key = BulletFieldKey::from_symbol(name);
        if key == BulletFieldKey::Unknown {
            continue;
        }
        if values.len() != key.arity() {
            return Err(FtlError::shape(
                location,
                format!(
                    "`{name}` takes {} value(s), found {}",
                    key.arity(),
                    values.len()
                ),
            ));
        }

        match key {
            BulletFieldKey::Uid => builder.uid = Some(cast_int(location, name, &values[0])?),
            BulletFieldKey::Position => {
                builder.position = Some((
                    cast_float(location, name, &values[0])?,
                    cast_float(location, name, &values[1])?,
                ))
            }
            BulletFieldKey::Direction => {
                builder.direction_degrees = Some(cast_float(location, name, &values[0])?)
            }
            BulletFieldKey::Speed => builder.speed = Some(cast_float(location, name, &values[0])?),
            BulletFieldKey::Unknown => unreachable!("unknown keys are skipped above"),
        }
    }

    builder.finish(location)
}

/// Integers pass through; floats are accepted only when they hold a whole number.
fn cast_int(location: &str, key: &str, value: &SyntaxNode) -> Result<i64, FtlError> {
    match value.unquoted() {
        SyntaxNode::Int(i) => Ok(*i),
        SyntaxNode::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(*f as i64),
        other => Err(FtlError::shape(
            location,
            format!("`{key}` must be an integer, found {}", describe(other)),
        )),
    }
}

fn cast_float(location: &str, key: &str, value: &SyntaxNode) -> Result<f64, FtlError> {
    match value.unquoted() {
        SyntaxNode::Int(i) => Ok(*i as f64),
        SyntaxNode::Float(f) => Ok(*f),
        other => Err(FtlError::shape(
            location,
            format!("`{key}` must be a number, found {}", describe(other)),
        )),
    }
}

/// Atoms are echoed as written; lists only by kind, so a large subtree never
/// ends up in an error message.
fn describe(node: &SyntaxNode) -> String {
    match node.unquoted() {
        SyntaxNode::Symbol(name) => format!("symbol `{name}`"),
        SyntaxNode::Int(i) => format!("integer {i}"),
        SyntaxNode::Float(f) => format!("float {f}"),
        SyntaxNode::Str(text) => format!("string {text:?}"),
        other => other.kind().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::syntax::parse;
    use rstest::rstest;

    fn build_text(text: &str) -> Result<Schedule, FtlError> {
        build(&parse(text).unwrap())
    }

    fn shape_error(text: &str) -> (String, String) {
        match build_text(text) {
            Err(FtlError::InvalidDocumentShape { location, reason }) => (location, reason),
            other => panic!("expected InvalidDocumentShape for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn builds_events_per_frame_in_document_order() {
        let schedule = build_text(
            "(ftl
               (frame 0
                 (bullet (uid 1) (position 0 0) (direction 90) (speed 2.5))
                 (bullet (uid 2) (position -10.5 3) (direction 180) (speed 1)))
               (frame 4))",
        )
        .unwrap();

        assert_eq!(schedule.frame_count(), 2);
        assert_eq!(schedule.last_frame(), 4);
        assert_eq!(schedule.events_at(4), Some(&[][..]));

        let frame0 = schedule.events_at(0).unwrap();
        assert_eq!(
            frame0,
            &[
                BulletEvent {
                    uid: 1,
                    position: (0.0, 0.0),
                    direction_degrees: 90.0,
                    speed: 2.5,
                },
                BulletEvent {
                    uid: 2,
                    position: (-10.5, 3.0),
                    direction_degrees: 180.0,
                    speed: 1.0,
                },
            ]
        );
    }

    #[test]
    fn quoted_nodes_are_unwrapped_at_every_level() {
        let plain = build_text(
            "(ftl (frame 2 (bullet (uid 7) (position 1 2) (direction 0) (speed 3))))",
        )
        .unwrap();
        let quoted = build_text(
            "'(ftl '(frame '2 '(bullet '(uid 7) (position '1 2) (direction 0) (speed 3))))",
        )
        .unwrap();
        assert_eq!(plain, quoted);
    }

    #[test]
    fn repeated_frame_number_keeps_the_last_block() {
        let schedule = build_text(
            "(ftl
               (frame 3 (bullet (uid 1) (position 0 0) (direction 0) (speed 1)))
               (frame 1)
               (frame 3 (bullet (uid 2) (position 5 5) (direction 45) (speed 2))))",
        )
        .unwrap();

        let events = schedule.events_at(3).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].uid, 2);
        assert_eq!(schedule.frame_count(), 2);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let schedule = build_text(
            "(ftl (frame 0 (bullet (uid 1) (color red green) (position 0 0) (direction 0) (speed 1) (tag))))",
        )
        .unwrap();
        assert_eq!(schedule.event_count(), 1);
    }

    #[test]
    fn empty_document_has_no_frames() {
        let schedule = build_text("(ftl)").unwrap();
        assert!(schedule.is_empty());
        assert_eq!(schedule.last_frame(), 0);
    }

    #[test]
    fn integral_float_uid_is_accepted() {
        let schedule =
            build_text("(ftl (frame 0 (bullet (uid 4.0) (position 0 0) (direction 0) (speed 1))))")
                .unwrap();
        assert_eq!(schedule.events_at(0).unwrap()[0].uid, 4);
    }

    #[rstest]
    #[case("ftl", "document", "found symbol")]
    #[case("(film (frame 0))", "document", "`ftl`")]
    #[case("()", "document", "`ftl`")]
    #[case("(ftl (scene 0))", "frame #0", "`frame`")]
    #[case("(ftl 5)", "frame #0", "found integer")]
    #[case("(ftl (frame))", "frame #0", "missing")]
    #[case("(ftl (frame -1))", "frame #0", "non-negative")]
    #[case("(ftl (frame 1.5))", "frame #0", "non-negative integer")]
    #[case("(ftl (frame 0) (frame 2 (shot)))", "frame #1 (frame 2) > bullet #0", "`bullet`")]
    #[case(
        "(ftl (frame 0 (bullet (uid 1) (position 0 0) (direction 0) (speed 1)) (bullet (uid 2))))",
        "frame #0 (frame 0) > bullet #1",
        "missing position, direction, speed"
    )]
    #[case(
        "(ftl (frame 0 (bullet (position 0 0) (direction 0) (speed 1))))",
        "frame #0 (frame 0) > bullet #0",
        "missing uid"
    )]
    #[case(
        "(ftl (frame 0 (bullet (uid 1) (position 0) (direction 0) (speed 1))))",
        "frame #0 (frame 0) > bullet #0",
        "takes 2 value(s), found 1"
    )]
    #[case(
        "(ftl (frame 0 (bullet (uid x) (position 0 0) (direction 0) (speed 1))))",
        "frame #0 (frame 0) > bullet #0",
        "`uid` must be an integer"
    )]
    #[case(
        "(ftl (frame 0 (bullet (uid 1.5) (position 0 0) (direction 0) (speed 1))))",
        "frame #0 (frame 0) > bullet #0",
        "`uid` must be an integer"
    )]
    #[case(
        "(ftl (frame 0 (bullet (uid 1) (position 0 0) (direction \"up\") (speed 1))))",
        "frame #0 (frame 0) > bullet #0",
        "`direction` must be a number"
    )]
    #[case(
        "(ftl (frame 0 (bullet uid 1)))",
        "frame #0 (frame 0) > bullet #0",
        "(key value...)"
    )]
    fn rejects_invalid_shapes(
        #[case] text: &str,
        #[case] expected_location: &str,
        #[case] needle: &str,
    ) {
        let (location, reason) = shape_error(text);
        assert_eq!(location, expected_location);
        assert!(reason.contains(needle), "{reason:?} should mention {needle:?}");
    }

    #[rstest]
    #[case("(ftl (frame 1.5))", "frame number must be a non-negative integer, found float 1.5")]
    #[case("(ftl (frame x))", "frame number must be a non-negative integer, found symbol `x`")]
    #[case(
        "(ftl (frame 0 (bullet (uid (1 (2 (3)))) (position 0 0) (direction 0) (speed 1))))",
        "`uid` must be an integer, found list"
    )]
    #[case(
        "(ftl (frame 0 (bullet (uid 1) (position 0 0) (direction \"up\") (speed 1))))",
        "`direction` must be a number, found string \"up\""
    )]
    #[case("(ftl (frame 0 (bullet uid 1)))", "expected a `(key value...)` entry, found symbol")]
    fn error_reasons_describe_nodes_by_kind(#[case] text: &str, #[case] expected: &str) {
        let (_, reason) = shape_error(text);
        assert_eq!(reason, expected);
    }

    #[rstest]
    #[case("uid", BulletFieldKey::Uid)]
    #[case("position", BulletFieldKey::Position)]
    #[case("direction", BulletFieldKey::Direction)]
    #[case("speed", BulletFieldKey::Speed)]
    #[case("Speed", BulletFieldKey::Unknown)]
    #[case("accel", BulletFieldKey::Unknown)]
    fn field_keys(#[case] name: &str, #[case] expected: BulletFieldKey) {
        assert_eq!(BulletFieldKey::from_symbol(name), expected);
    }
}
