use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::alerts;
use crate::error::AppError;
use crate::session::Session;

/// A titled block of report text.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub title: String,
    pub body: String,
}

impl ReportSection {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Image,
    System,
}

impl ReportKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            ReportKind::Image => "image_chatbot_report.txt",
            ReportKind::System => "system_monitor_report.txt",
        }
    }

    pub fn path_in(&self, directory: &Path) -> PathBuf {
        directory.join(self.file_name())
    }
}

/// Writes `sections` to `path`, replacing any previous content. Sections are
/// separated by a blank line.
pub fn save_report(path: &Path, sections: &[ReportSection]) -> Result<(), AppError> {
    let mut text = String::new();
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            text.push('\n');
        }
        text.push_str(&section.title);
        text.push('\n');
        text.push_str(section.body.trim_end());
        text.push('\n');
    }

    fs::write(path, text)?;
    info!("Report saved to {}", path.display());
    Ok(())
}

/// Sections for `kind`, or `NothingToReport` when the session holds no
/// successful generation result for it yet.
pub fn sections_for(kind: ReportKind, session: &Session) -> Result<Vec<ReportSection>, AppError> {
    match kind {
        ReportKind::Image => {
            let analysis = session.image_analysis.as_ref().ok_or_else(|| {
                AppError::NothingToReport(
                    "Please analyze an image first to generate a report.".to_string(),
                )
            })?;
            let mut sections = vec![ReportSection::new("Chatbot Analysis:", &analysis.analysis)];
            if let Some(answer) = analysis.answer.as_ref() {
                sections.push(ReportSection::new("Answer to your question:", answer));
            }
            Ok(sections)
        }
        ReportKind::System => {
            if session.suggestions.is_empty() {
                return Err(AppError::NothingToReport(
                    "Please get suggestions first to generate a report.".to_string(),
                ));
            }

            let mut sections = Vec::new();
            if let Some(sample) = session.samples.latest() {
                sections.push(ReportSection::new(
                    "Latest Sample:",
                    format!(
                        "Time: {}\nCPU: {:.1}%\nMemory: {:.1}%\nDisk: {:.1}%",
                        sample.time_display(),
                        sample.cpu_pct,
                        sample.mem_pct,
                        sample.disk_pct
                    ),
                ));

                let thresholds = session.thresholds.to_vec();
                let alerts = alerts::check(sample, &thresholds);
                let body = if alerts.is_empty() {
                    "None".to_string()
                } else {
                    alerts
                        .iter()
                        .map(|a| a.to_string())
                        .collect::<Vec<_>>()
                        .join("\n")
                };
                sections.push(ReportSection::new("Alerts:", body));
            }

            let suggestions = session
                .suggestions
                .iter()
                .enumerate()
                .map(|(i, record)| format!("{}. {}", i + 1, record.response_text.trim()))
                .collect::<Vec<_>>()
                .join("\n\n");
            sections.push(ReportSection::new("Suggestions:", suggestions));
            Ok(sections)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::{ImageAnalysis, Sample, SuggestionRecord};

    #[test]
    fn test_sections_are_written_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        save_report(
            &path,
            &[
                ReportSection::new("First:", "one\n"),
                ReportSection::new("Second:", "two"),
            ],
        )
        .unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "First:\none\n\nSecond:\ntwo\n"
        );
    }

    #[test]
    fn test_save_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        save_report(&path, &[ReportSection::new("Old:", "a much longer first body")]).unwrap();
        save_report(&path, &[ReportSection::new("New:", "b")]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "New:\nb\n");
    }

    #[test]
    fn test_unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.txt");
        let err = save_report(&path, &[ReportSection::new("T:", "b")]).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn test_image_sections_require_analysis() {
        let mut session = Session::new(&AppConfig::default());
        assert!(matches!(
            sections_for(ReportKind::Image, &session),
            Err(AppError::NothingToReport(_))
        ));

        session.image_analysis = Some(ImageAnalysis {
            analysis: "A dog.".to_string(),
            answer: None,
        });
        let sections = sections_for(ReportKind::Image, &session).unwrap();
        assert_eq!(sections, vec![ReportSection::new("Chatbot Analysis:", "A dog.")]);

        session.image_analysis = Some(ImageAnalysis {
            analysis: "A dog.".to_string(),
            answer: Some("Brown.".to_string()),
        });
        let sections = sections_for(ReportKind::Image, &session).unwrap();
        assert_eq!(sections[1].title, "Answer to your question:");
    }

    #[test]
    fn test_system_sections() {
        let mut session = Session::new(&AppConfig::default());
        session.samples.push(Sample {
            cpu_pct: 85.0,
            mem_pct: 50.0,
            disk_pct: 60.0,
            timestamp: 0.0,
        });
        assert!(sections_for(ReportKind::System, &session).is_err());

        session.suggestions.push(SuggestionRecord {
            prompt_text: "p".to_string(),
            response_text: "Close the browser.".to_string(),
        });
        let sections = sections_for(ReportKind::System, &session).unwrap();
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Latest Sample:", "Alerts:", "Suggestions:"]);
        assert!(sections[0].body.contains("CPU: 85.0%"));
        assert!(sections[1].body.contains("CPU usage 85.0% exceeds threshold 80.0%"));
        assert_eq!(sections[2].body, "1. Close the browser.");
    }

    #[test]
    fn test_report_file_names() {
        let dir = Path::new("/home/user");
        assert_eq!(
            ReportKind::Image.path_in(dir),
            PathBuf::from("/home/user/image_chatbot_report.txt")
        );
        assert_eq!(ReportKind::System.file_name(), "system_monitor_report.txt");
    }
}
