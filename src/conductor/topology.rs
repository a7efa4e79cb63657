//! Validation of the detected local bus topology
//!
//! The expected topology is described by a plain text file with one decimal number per line.
//! The first line is the number of modules, followed by the four descriptor words of each module
//! in bus order.  This is exactly the tail of the "read configuration" reply starting at the
//! module count, so a description can be generated from a known-good bus (see
//! [`ExpectedTopology::from_reply()`]).
use crate::consts;
use crate::master::Command;
use std::io::BufRead;
use std::path::Path;

/// Number of description lines expected for a bus with `modules` modules.
#[inline]
pub fn expected_lines(modules: u16) -> usize {
    usize::from(modules) * consts::WORDS_PER_MODULE + 1
}

fn unreadable(path: &Path, source: std::io::Error) -> crate::Error {
    crate::Error::TopologyDescriptionUnreadable {
        path: path.to_owned(),
        source,
    }
}

fn strip_whitespace(line: &str) -> String {
    line.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Iterate over the raw lines of a description.
///
/// Undecodable bytes are replaced rather than reported, so a garbled entry surfaces as a content
/// error on its line.  Only failing reads are I/O errors.
fn raw_lines<R: BufRead>(mut source: R) -> impl Iterator<Item = std::io::Result<String>> {
    let mut buf = Vec::new();
    std::iter::from_fn(move || {
        buf.clear();
        match source.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => Some(Ok(String::from_utf8_lossy(&buf).into_owned())),
            Err(e) => Some(Err(e)),
        }
    })
}

/// Validate a "read configuration" reply against the topology description at `path`.
pub fn validate_file<P: AsRef<Path>>(
    path: P,
    reply: &[u16],
    modules: u16,
) -> Result<(), crate::Error> {
    let path = path.as_ref();
    let f = std::fs::File::open(path).map_err(|e| unreadable(path, e))?;
    validate(std::io::BufReader::new(f), path, reply, modules)
}

/// Validate a "read configuration" reply against a topology description.
///
/// `origin` names the description in errors.  Lines are compared textually and in order against
/// the reply words starting at the module count.  Trailing blank lines after the last expected
/// entry are ignored.
pub fn validate<R: BufRead>(
    source: R,
    origin: &Path,
    reply: &[u16],
    modules: u16,
) -> Result<(), crate::Error> {
    let expected = expected_lines(modules);
    let mut lines = raw_lines(source);
    let mut actual = 0;
    let mut index = consts::REPLY_MODULE_COUNT;

    while actual < expected {
        let line = match lines.next() {
            Some(line) => line.map_err(|e| unreadable(origin, e))?,
            None => break,
        };
        let token = strip_whitespace(&line);
        actual += 1;

        if token.is_empty() {
            return Err(crate::Error::TopologyEmptyLine { line: actual });
        }

        let word = *reply
            .get(index)
            .ok_or_else(|| crate::Error::MalformedResponse {
                command: Command::ReadConfiguration,
                length: reply.len(),
                required: index + 1,
            })?;

        if token != word.to_string() {
            return Err(crate::Error::TopologyMismatch {
                line: actual,
                expected: token,
                actual: word,
            });
        }
        index += 1;
    }

    let mut found = actual;
    for line in lines {
        if !line.map_err(|e| unreadable(origin, e))?.trim().is_empty() {
            found += 1;
        }
    }

    if found != expected {
        return Err(crate::Error::TopologyLineCountMismatch { expected, found });
    }
    Ok(())
}

/// Parsed form of a topology description
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct ExpectedTopology {
    tokens: Vec<u16>,
}

impl ExpectedTopology {
    /// Build the description matching a "read configuration" reply.
    pub fn from_reply(reply: &[u16]) -> Result<Self, crate::Error> {
        crate::master::require_reply_length(
            Command::ReadConfiguration,
            reply,
            consts::REPLY_MODULE_COUNT + 1,
        )?;
        let end = consts::REPLY_MODULE_COUNT + expected_lines(reply[consts::REPLY_MODULE_COUNT]);
        crate::master::require_reply_length(Command::ReadConfiguration, reply, end)?;

        Ok(Self {
            tokens: reply[consts::REPLY_MODULE_COUNT..end].to_vec(),
        })
    }

    /// Parse a topology description.
    ///
    /// Whitespace is stripped from every line; empty lines and entries that are not 16-bit
    /// decimal numbers are rejected.
    pub fn parse<R: BufRead>(source: R, origin: &Path) -> Result<Self, crate::Error> {
        let mut tokens = Vec::new();
        for (i, line) in raw_lines(source).enumerate() {
            let token = strip_whitespace(&line.map_err(|e| unreadable(origin, e))?);
            if token.is_empty() {
                return Err(crate::Error::TopologyEmptyLine { line: i + 1 });
            }
            // Only plain decimal digits are accepted; `u16::from_str` would allow a sign.
            let value = token
                .bytes()
                .all(|b| b.is_ascii_digit())
                .then(|| token.parse::<u16>().ok())
                .flatten()
                .ok_or_else(|| crate::Error::TopologyInvalidEntry {
                    line: i + 1,
                    token: token.clone(),
                })?;
            tokens.push(value);
        }
        Ok(Self { tokens })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let f = std::fs::File::open(path).map_err(|e| unreadable(path, e))?;
        Self::parse(std::io::BufReader::new(f), path)
    }

    /// All entries, starting with the module count.
    #[inline(always)]
    pub fn tokens(&self) -> &[u16] {
        &self.tokens
    }

    /// Module count declared on the first line.
    pub fn module_count(&self) -> Option<u16> {
        self.tokens.first().copied()
    }

    /// Descriptor words of each module.
    pub fn modules(&self) -> impl Iterator<Item = &[u16]> {
        self.tokens
            .get(1..)
            .unwrap_or(&[])
            .chunks(consts::WORDS_PER_MODULE)
    }

    /// Whether the number of entries matches the declared module count.
    pub fn is_complete(&self) -> bool {
        self.module_count()
            .map(|n| expected_lines(n) == self.tokens.len())
            .unwrap_or(false)
    }

    /// Write the description, one entry per line.
    pub fn write_to<W: std::io::Write>(&self, mut w: W) -> std::io::Result<()> {
        for token in self.tokens.iter() {
            writeln!(w, "{}", token)?;
        }
        w.flush()
    }

    /// Create (or replace) the description file at `path`.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), crate::Error> {
        let path = path.as_ref();
        let unwritable = |source| crate::Error::TopologyDescriptionUnwritable {
            path: path.to_owned(),
            source,
        };
        let f = std::fs::File::create(path).map_err(unwritable)?;
        self.write_to(std::io::BufWriter::new(f))
            .map_err(unwritable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reply for two modules: module count at word 7, descriptors in words 8..16.
    fn reply_two_modules() -> Vec<u16> {
        vec![
            0x830B, 14, 0, 0, 3, 0, 0, // header
            2, // module count
            256, 8192, 0, 0, // module 1
            257, 8193, 12, 34, // module 2
        ]
    }

    fn check(description: &str, reply: &[u16], modules: u16) -> Result<(), crate::Error> {
        validate(description.as_bytes(), Path::new("test.txt"), reply, modules)
    }

    #[test]
    fn matching_description() {
        let reply = reply_two_modules();
        check("2\n256\n8192\n0\n0\n257\n8193\n12\n34\n", &reply, 2).unwrap();
    }

    #[test]
    fn whitespace_is_stripped() {
        let reply = reply_two_modules();
        check(" 2\r\n2 56\n8192\t\n0\n0\n257\n8193\n12\n34", &reply, 2).unwrap();
    }

    #[test]
    fn mismatch_reports_line_and_values() {
        let reply = reply_two_modules();
        let err = check("2\n256\n8193\n0\n0\n257\n8193\n12\n34\n", &reply, 2).unwrap_err();
        match err {
            crate::Error::TopologyMismatch {
                line,
                expected,
                actual,
            } => {
                assert_eq!(line, 3);
                assert_eq!(expected, "8193");
                assert_eq!(actual, 8192);
            }
            e => panic!("unexpected error {e:?}"),
        }
    }

    #[test]
    fn comparison_is_textual() {
        let reply = reply_two_modules();
        let err = check("02\n", &reply, 2).unwrap_err();
        assert!(matches!(err, crate::Error::TopologyMismatch { line: 1, .. }));
    }

    #[test]
    fn short_description() {
        let reply = reply_two_modules();
        let err = check("2\n256\n8192\n0\n0\n", &reply, 2).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::TopologyLineCountMismatch {
                expected: 9,
                found: 5
            }
        ));
    }

    #[test]
    fn long_description() {
        let reply = reply_two_modules();
        let err = check("2\n256\n8192\n0\n0\n257\n8193\n12\n34\n99\n", &reply, 2).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::TopologyLineCountMismatch {
                expected: 9,
                found: 10
            }
        ));

        // Trailing blank lines are fine though
        check("2\n256\n8192\n0\n0\n257\n8193\n12\n34\n\n  \n", &reply, 2).unwrap();
    }

    #[test]
    fn empty_line() {
        let reply = reply_two_modules();
        let err = check("2\n256\n\n0\n", &reply, 2).unwrap_err();
        assert!(matches!(err, crate::Error::TopologyEmptyLine { line: 3 }));

        let err = check("2\n256\n \t\n0\n", &reply, 2).unwrap_err();
        assert!(matches!(err, crate::Error::TopologyEmptyLine { line: 3 }));
    }

    #[test]
    fn reply_too_short_for_description() {
        let mut reply = reply_two_modules();
        reply.truncate(10);
        let err = check("2\n256\n8192\n0\n", &reply, 2).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::MalformedResponse {
                length: 10,
                required: 11,
                ..
            }
        ));
    }

    #[test]
    fn missing_file() {
        let err = validate_file("/nonexistent/busconductor/config.txt", &reply_two_modules(), 2)
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::TopologyDescriptionUnreadable);
    }

    #[test]
    fn validate_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut f, b"2\n256\n8192\n0\n0\n257\n8193\n12\n34\n").unwrap();
        validate_file(f.path(), &reply_two_modules(), 2).unwrap();
    }

    #[test]
    fn teach_in_roundtrip() {
        let reply = reply_two_modules();
        let topology = ExpectedTopology::from_reply(&reply).unwrap();
        assert_eq!(topology.module_count(), Some(2));
        assert!(topology.is_complete());
        assert_eq!(
            topology.modules().collect::<Vec<_>>(),
            vec![&[256, 8192, 0, 0][..], &[257, 8193, 12, 34][..]]
        );

        let mut text = Vec::new();
        topology.write_to(&mut text).unwrap();
        check(std::str::from_utf8(&text).unwrap(), &reply, 2).unwrap();

        let parsed = ExpectedTopology::parse(&text[..], Path::new("taught.txt")).unwrap();
        assert_eq!(parsed, topology);
    }

    #[test]
    fn undecodable_line_is_a_mismatch() {
        let reply = reply_two_modules();
        let err = validate(&b"\xff\n"[..], Path::new("test.txt"), &reply, 0).unwrap_err();
        assert!(matches!(err, crate::Error::TopologyMismatch { line: 1, actual: 2, .. }));

        let err = validate(&b"2\n256\n81\xc3\n"[..], Path::new("test.txt"), &reply, 2).unwrap_err();
        assert!(matches!(err, crate::Error::TopologyMismatch { line: 3, actual: 8192, .. }));

        let err = ExpectedTopology::parse(&b"1\n\xfe\n"[..], Path::new("x")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::TopologyInvalidEntry);
    }

    #[test]
    fn failing_read_is_unreadable() {
        struct Broken;

        impl std::io::Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("device gone"))
            }
        }

        let err = validate(
            std::io::BufReader::new(Broken),
            Path::new("broken.txt"),
            &reply_two_modules(),
            2,
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::TopologyDescriptionUnreadable);
    }

    /// Accepts everything into its buffer, fails once data is pushed out.
    struct FullDevice;

    impl std::io::Write for FullDevice {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("no space left on device"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn buffered_write_errors_are_reported() {
        let topology = ExpectedTopology::from_reply(&reply_two_modules()).unwrap();
        let err = topology
            .write_to(std::io::BufWriter::new(FullDevice))
            .unwrap_err();
        assert_eq!(err.to_string(), "no space left on device");
    }

    #[test]
    fn write_file_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("config.txt");
        let topology = ExpectedTopology::from_reply(&reply_two_modules()).unwrap();

        let err = topology.write_file(&path).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::TopologyDescriptionUnwritable);

        let path = dir.path().join("config.txt");
        topology.write_file(&path).unwrap();
        assert_eq!(ExpectedTopology::from_file(&path).unwrap(), topology);
    }

    #[test]
    fn from_reply_needs_all_descriptors() {
        let mut reply = reply_two_modules();
        reply.pop();
        assert!(ExpectedTopology::from_reply(&reply).is_err());
    }

    #[rstest::rstest]
    #[case("1\n-5\n", 2)]
    #[case("1\n0x10\n", 2)]
    #[case("70000\n", 1)]
    #[case("+3\n", 1)]
    fn parse_rejects_invalid_entries(#[case] source: &str, #[case] bad_line: usize) {
        let err = ExpectedTopology::parse(source.as_bytes(), Path::new("bad.txt")).unwrap_err();
        match err {
            crate::Error::TopologyInvalidEntry { line, .. } => assert_eq!(line, bad_line),
            e => panic!("unexpected error {e:?}"),
        }
    }

    #[test]
    fn parse_incomplete() {
        let topology = ExpectedTopology::parse("3\n1\n2\n".as_bytes(), Path::new("x")).unwrap();
        assert_eq!(topology.module_count(), Some(3));
        assert!(!topology.is_complete());
    }
}
