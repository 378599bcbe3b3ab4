//! JUnit-style XML reports
//!
//! One report is written per platform at `<results_dir>/<platform>/results.xml`.
//! The `status` attribute of each case carries the raw emulator exit code.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::{Error, Result};

use super::emulator::TestStatus;

/// File name of every platform report
pub const REPORT_FILE: &str = "results.xml";

/// Outcome of one emulator run
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub name: String,
    pub elapsed: Duration,
    pub status: TestStatus,
}

impl TestCase {
    fn failure_message(&self) -> Option<String> {
        match self.status {
            TestStatus::Exited(0) => None,
            TestStatus::Exited(code) => Some(format!("emulator exited with status {}", code)),
            TestStatus::Signaled => Some("emulator was terminated by a signal".to_string()),
            TestStatus::TimedOut => Some("emulator timed out".to_string()),
        }
    }
}

/// All test cases for one platform
#[derive(Debug, Clone, PartialEq)]
pub struct TestSuite {
    pub name: String,
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
        }
    }

    pub fn failures(&self) -> usize {
        self.cases.iter().filter(|c| !c.status.passed()).count()
    }

    pub fn total_time(&self) -> Duration {
        self.cases.iter().map(|c| c.elapsed).sum()
    }

    /// Render the suite as a JUnit XML document
    pub fn to_xml(&self) -> String {
        let tests = self.cases.len();
        let failures = self.failures();
        let time = secs(self.total_time());

        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        let _ = writeln!(
            xml,
            "<testsuites disabled=\"0\" errors=\"0\" failures=\"{}\" tests=\"{}\" time=\"{}\">",
            failures, tests, time
        );
        let _ = writeln!(
            xml,
            "\t<testsuite disabled=\"0\" errors=\"0\" failures=\"{}\" name=\"{}\" skipped=\"0\" tests=\"{}\" time=\"{}\">",
            failures,
            escape(&self.name),
            tests,
            time
        );

        for case in &self.cases {
            let status = case.status.code().map(|c| c.to_string()).unwrap_or_default();
            let open = format!(
                "\t\t<testcase name=\"{}\" status=\"{}\" time=\"{}\"",
                escape(&case.name),
                status,
                secs(case.elapsed)
            );
            match case.failure_message() {
                None => {
                    let _ = writeln!(xml, "{}/>", open);
                }
                Some(message) => {
                    let _ = writeln!(xml, "{}>", open);
                    let _ = writeln!(
                        xml,
                        "\t\t\t<failure type=\"failure\" message=\"{}\"/>",
                        escape(&message)
                    );
                    xml.push_str("\t\t</testcase>\n");
                }
            }
        }

        xml.push_str("\t</testsuite>\n");
        xml.push_str("</testsuites>\n");
        xml
    }

    /// Write the report under `results_dir`, replacing any previous one
    ///
    /// The document goes to a temporary file in the platform directory
    /// first and is then renamed over `results.xml`.
    pub fn write(&self, results_dir: &Path) -> Result<PathBuf> {
        let dir = results_dir.join(&self.name);
        std::fs::create_dir_all(&dir).map_err(|e| Error::report_write(&dir, e))?;

        let path = dir.join(REPORT_FILE);
        let mut tmp =
            tempfile::NamedTempFile::new_in(&dir).map_err(|e| Error::report_write(&path, e))?;
        tmp.write_all(self.to_xml().as_bytes())
            .map_err(|e| Error::report_write(&path, e))?;

        // Temp files are created owner-only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o644))
                .map_err(|e| Error::report_write(&path, e))?;
        }
        tmp.persist(&path)
            .map_err(|e| Error::report_write(&path, e.error))?;

        tracing::info!(
            platform = %self.name,
            report = %path.display(),
            tests = self.cases.len(),
            failures = self.failures(),
            "Wrote test report"
        );

        Ok(path)
    }
}

fn secs(d: Duration) -> String {
    format!("{:.3}", d.as_secs_f64())
}

/// Escape text for use inside an XML attribute value
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(name: &str, millis: u64, status: TestStatus) -> TestCase {
        TestCase {
            name: name.to_string(),
            elapsed: Duration::from_millis(millis),
            status,
        }
    }

    #[test]
    fn test_passing_suite_xml() {
        let suite = TestSuite {
            name: "gameboy".to_string(),
            cases: vec![case("cpu_instrs", 1500, TestStatus::Exited(0))],
        };

        let expected = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<testsuites disabled=\"0\" errors=\"0\" failures=\"0\" tests=\"1\" time=\"1.500\">\n\
\t<testsuite disabled=\"0\" errors=\"0\" failures=\"0\" name=\"gameboy\" skipped=\"0\" tests=\"1\" time=\"1.500\">\n\
\t\t<testcase name=\"cpu_instrs\" status=\"0\" time=\"1.500\"/>\n\
\t</testsuite>\n\
</testsuites>\n";
        assert_eq!(suite.to_xml(), expected);
    }

    #[test]
    fn test_failing_case_has_failure_element() {
        let suite = TestSuite {
            name: "chip8".to_string(),
            cases: vec![
                case("ok", 10, TestStatus::Exited(0)),
                case("bad", 20, TestStatus::Exited(2)),
                case("hung", 30, TestStatus::TimedOut),
            ],
        };
        let xml = suite.to_xml();

        assert!(xml.contains("failures=\"2\" tests=\"3\" time=\"0.060\""));
        assert!(xml.contains("<testcase name=\"bad\" status=\"2\" time=\"0.020\">"));
        assert!(xml.contains("message=\"emulator exited with status 2\""));
        assert!(xml.contains("<testcase name=\"hung\" status=\"\" time=\"0.030\">"));
        assert!(xml.contains("message=\"emulator timed out\""));
    }

    #[test]
    fn test_names_are_escaped() {
        let suite = TestSuite {
            name: "a&b".to_string(),
            cases: vec![case("<\"x'>", 0, TestStatus::Exited(0))],
        };
        let xml = suite.to_xml();
        assert!(xml.contains("name=\"a&amp;b\""));
        assert!(xml.contains("name=\"&lt;&quot;x&apos;&gt;\""));
    }

    #[test]
    fn test_write_creates_dirs_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("nested").join("results");

        let mut suite = TestSuite::new("gb");
        suite.cases.push(case("one", 1, TestStatus::Exited(0)));
        let path = suite.write(&results).unwrap();
        assert_eq!(path, results.join("gb").join(REPORT_FILE));

        suite.cases[0].status = TestStatus::Exited(1);
        suite.write(&results).unwrap();

        let xml = std::fs::read_to_string(&path).unwrap();
        assert_eq!(xml.matches("<testcase ").count(), 1);
        assert!(xml.contains("status=\"1\""));

        let files: Vec<_> = std::fs::read_dir(results.join("gb")).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_write_fails_when_results_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("results");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = TestSuite::new("gb").write(&blocker).unwrap_err();
        assert!(matches!(err, Error::ReportWrite { .. }));
    }
}
