use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use anyhow::Result;

use super::loader;
use super::model::DealDataset;

// ---------------------------------------------------------------------------
// Process-wide dataset cache
// ---------------------------------------------------------------------------

// The source table is treated as immutable for the session: each distinct
// path is parsed once and the result shared from then on.
static DATASETS: OnceLock<Mutex<HashMap<PathBuf, Arc<DealDataset>>>> = OnceLock::new();

fn store() -> &'static Mutex<HashMap<PathBuf, Arc<DealDataset>>> {
    DATASETS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Load the dataset at `path`, parsing it on first access and returning the
/// cached copy afterwards. A load failure is not cached; the next call
/// retries the parse.
pub fn load(path: &Path) -> Result<Arc<DealDataset>> {
    let mut map = store().lock().expect("dataset cache poisoned");
    if let Some(ds) = map.get(path) {
        return Ok(Arc::clone(ds));
    }
    let dataset = Arc::new(loader::load_file(path)?);
    map.insert(path.to_path_buf(), Arc::clone(&dataset));
    Ok(dataset)
}

/// Drop every cached dataset. Invalidation hook for tests; nothing in the
/// running app calls this.
pub fn invalidate_all() {
    store().lock().expect("dataset cache poisoned").clear();
}
