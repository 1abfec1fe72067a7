use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::common::{NormalizedPost, POST_COLUMNS, PostTable};
use crate::errors::SinkError;

/// 📄 CsvSink: turns a [`PostTable`] into `<output_path>/<file_name>.csv`.
///
/// The whole table is encoded in memory and written in one go. A day of top
/// posts is a few hundred rows; the disk gets one write, not one per row.
///
/// ⚠️ The target is truncated without asking. Same file name, same day, same
/// artifact, newest wins.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 🚰 Header first, then one row per post, in table order. No index column.
    ///
    /// Creates missing parent directories. Fails with `SinkError::CreateDir`
    /// when a parent cannot be created and `SinkError::Write` when the file
    /// itself cannot be written.
    pub async fn write(&self, table: &PostTable) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SinkError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let the_bytes = encode(table).map_err(|err| match err {
            EncodeError::Csv(err) => SinkError::Csv(err),
            EncodeError::Flush(source) => SinkError::Write {
                path: self.path.clone(),
                source,
            },
        })?;

        tokio::fs::write(&self.path, &the_bytes)
            .await
            .map_err(|source| SinkError::Write {
                path: self.path.clone(),
                source,
            })?;

        info!(
            "📄 Wrote {} rows ({} bytes) to {}",
            table.len(),
            the_bytes.len(),
            self.path.display()
        );
        Ok(())
    }
}

enum EncodeError {
    Csv(csv::Error),
    Flush(std::io::Error),
}

fn encode(table: &PostTable) -> Result<Vec<u8>, EncodeError> {
    // -- header by hand: serde only emits one after the first row, an empty day gets none
    let mut the_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    the_writer.write_record(POST_COLUMNS).map_err(EncodeError::Csv)?;
    for row in &table.rows {
        the_writer.serialize(row).map_err(EncodeError::Csv)?;
    }
    the_writer
        .into_inner()
        .map_err(|err| EncodeError::Flush(err.into_error()))
}

/// 🔍 Read an artifact back into a [`PostTable`]. The inverse of [`CsvSink::write`].
pub async fn read_table(path: &Path) -> Result<PostTable, SinkError> {
    let the_bytes = tokio::fs::read(path)
        .await
        .map_err(|source| SinkError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let mut the_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(the_bytes.as_slice());

    let rows = the_reader
        .deserialize::<NormalizedPost>()
        .collect::<Result<Vec<_>, _>>()?;

    debug!("🔍 read {} rows back from {}", rows.len(), path.display());
    Ok(PostTable::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn a_post(id: &str, edited: bool) -> NormalizedPost {
        NormalizedPost {
            id: id.to_string(),
            title: format!("Why is my {id} pipeline, \"slow\"?"),
            score: 42,
            num_comments: 7,
            author: "None".to_string(),
            created_utc: DateTime::from_timestamp(1_700_000_000, 500_000_000),
            url: format!("https://reddit.com/{id}"),
            over_18: false,
            edited,
            spoiler: true,
            stickied: false,
        }
    }

    #[tokio::test]
    async fn the_one_where_what_goes_in_comes_back_out() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_path = the_dir.path().join("reddit_20240117.csv");
        let mut the_undated = a_post("p2", true);
        the_undated.created_utc = None;
        let the_table = PostTable::new(vec![a_post("p1", false), the_undated]);

        CsvSink::new(&the_path).write(&the_table).await?;
        let the_echo = read_table(&the_path).await?;

        assert_eq!(the_echo, the_table);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_header_never_changes_its_mind() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_path = the_dir.path().join("empty.csv");

        CsvSink::new(&the_path).write(&PostTable::default()).await?;

        let the_contents = std::fs::read_to_string(&the_path)?;
        assert_eq!(the_contents.trim_end(), POST_COLUMNS.join(","));
        assert!(read_table(&the_path).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_booleans_and_timestamps_look_like_people_expect() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_path = the_dir.path().join("shape.csv");

        CsvSink::new(&the_path)
            .write(&PostTable::new(vec![a_post("p1", true)]))
            .await?;

        let the_contents = std::fs::read_to_string(&the_path)?;
        let the_row = the_contents.lines().nth(1).unwrap_or_default();
        assert!(the_row.starts_with("p1,"));
        assert!(the_row.contains("2023-11-14 22:13:20.500"));
        assert!(the_row.ends_with(",false,true,true,false"));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_missing_directories_get_built_and_old_files_get_replaced()
    -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_path = the_dir.path().join("data").join("output").join("run.csv");

        CsvSink::new(&the_path)
            .write(&PostTable::new(vec![a_post("p1", false), a_post("p2", false)]))
            .await?;
        CsvSink::new(&the_path)
            .write(&PostTable::new(vec![a_post("p3", false)]))
            .await?;

        let the_echo = read_table(&the_path).await?;
        assert_eq!(the_echo.len(), 1);
        assert_eq!(the_echo.rows[0].id, "p3");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_parent_is_a_file_and_everyone_is_sad() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_imposter = the_dir.path().join("not_a_dir");
        std::fs::write(&the_imposter, "surprise")?;

        let the_verdict = CsvSink::new(the_imposter.join("run.csv"))
            .write(&PostTable::default())
            .await;
        assert!(matches!(the_verdict, Err(SinkError::CreateDir { .. })));
        Ok(())
    }
}
