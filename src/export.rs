use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

/// One CSV row. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: String,
    pub date_created: String,
    pub author: String,
    pub workflow: String,
    pub service: String,
    pub urgency: String,
    pub problem_type: String,
    pub question_text: String,
    pub raw_message: String,
}

/// Write records to `path`, replacing any existing file.
///
/// Does nothing for an empty slice, so a run that matched nothing leaves the
/// previous export in place.
pub fn write_csv(records: &[Record], path: &Path) -> Result<()> {
    if records.is_empty() {
        debug!("No records, skipping {}", path.display());
        return Ok(());
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str, question: &str) -> Record {
        Record {
            id: id.to_string(),
            date_created: "2024-03-10 12:00:00".into(),
            author: "Иван Петров".into(),
            workflow: "Дебетовые карты - Перевыпуск".into(),
            service: "Дебетовая карта".into(),
            urgency: "Высокая".into(),
            problem_type: "Карта заблокирована".into(),
            question_text: question.to_string(),
            raw_message: format!("**Дебетовые карты**\n**Вопрос**: {}\n**", question),
        }
    }

    #[test]
    fn empty_records_do_not_touch_the_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out.csv");
        write_csv(&[], &path).unwrap();
        assert!(!path.exists());
        assert!(!dir.path().join("nested").exists());
    }

    #[test]
    fn empty_records_keep_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "previous").unwrap();
        write_csv(&[], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");
    }

    #[test]
    fn writes_header_and_rows_with_cyrillic_intact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data/raw/cards.csv");
        let records = vec![
            record("a", "Почему, \"карта\" не работает?"),
            record("b", "Где карта?\nУже неделя"),
        ];
        write_csv(&records, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(
            "id,date_created,author,workflow,service,urgency,problem_type,question_text,raw_message\r\n"
        ));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "a");
        assert_eq!(rows[0][2], "Иван Петров");
        assert_eq!(rows[0][7], "Почему, \"карта\" не работает?");
        assert_eq!(rows[1][7], "Где карта?\nУже неделя");
        assert_eq!(rows[1][8], records[1].raw_message);
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&[record("a", "1"), record("b", "2")], &path).unwrap();
        write_csv(&[record("c", "3")], &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let ids: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[0].to_string())
            .collect();
        assert_eq!(ids, vec!["c"]);
    }
}
