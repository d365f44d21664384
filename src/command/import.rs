use crate::conf::Conf;
use crate::service::import;
use crate::Result;
use rusqlite::Connection;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

pub fn run(path: &Path, conf: &Conf, conn: &mut Connection) -> Result<()> {
    info!(path = %path.display(), "Importing customers");
    let file = BufReader::new(File::open(path)?);
    let report = import::import(file, conf.import_batch_size, conn)?;
    info!(
        deleted = report.deleted,
        imported = report.imported,
        skipped = report.skipped,
        "Import finished"
    );
    Ok(())
}
