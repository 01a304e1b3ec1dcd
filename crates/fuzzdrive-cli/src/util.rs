use std::{
    fmt,
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Serialize, de::DeserializeOwned};

/// Where a JSON document is written: a file, or stdout when no path was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    pub(crate) fn new(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Stdout, Self::File)
    }

    pub(crate) fn write_json<T>(&self, value: &T) -> anyhow::Result<()>
    where
        T: Serialize + ?Sized,
    {
        let result = match self {
            Self::Stdout => write_pretty(&mut io::stdout().lock(), value),
            Self::File(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create output file: {}", path.display()))?;
                write_pretty(&mut BufWriter::new(file), value)
            }
        };
        result.with_context(|| format!("Failed to write JSON to {self}"))
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn write_pretty<W, T>(writer: &mut W, value: &T) -> anyhow::Result<()>
where
    W: Write,
    T: Serialize + ?Sized,
{
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub(crate) fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {file_kind} file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {file_kind} JSON file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_json_file_round_trip() {
        let path = std::env::temp_dir().join(format!("fuzzdrive-util-{}.json", std::process::id()));
        let value = BTreeMap::from([("ticks", 12), ("collisions", 0)]);
        let destination = Destination::new(Some(path.clone()));
        destination.write_json(&value).unwrap();
        let read: BTreeMap<String, i32> = read_json_file("test", &path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(read["ticks"], 12);
        assert_eq!(read["collisions"], 0);
    }

    #[test]
    fn test_missing_file_names_its_kind() {
        let err = read_json_file::<BTreeMap<String, i32>, _>("model", "/nonexistent/model.json")
            .unwrap_err();
        assert!(err.to_string().contains("model file"));
    }

    #[test]
    fn test_destination_display() {
        assert_eq!(Destination::new(None).to_string(), "stdout");
        assert_eq!(
            Destination::new(Some(PathBuf::from("out.json"))).to_string(),
            "out.json"
        );
    }
}
