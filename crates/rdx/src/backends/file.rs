// ai
//! 📂 File Backend: where the normalized table becomes a CSV on disk.
//!
//! The sink is deliberately boring: create the parent directory, truncate the
//! file, write a header, write the rows. It also knows how to read its own
//! format back, which the `preview` command and the tests both lean on.
//!
//! 🚰 PostTable → csv::Writer → `<output_path>/<file_name>.csv`
//! 💀 Parent directory refuses to exist → `SinkError::CreateDir`
//! 🦆 (mandatory, no notes)

mod csv_sink;

pub use csv_sink::{CsvSink, read_table};
