//! The matrix store: loads the three matrices once and memoises the
//! combined prompt text for the lifetime of the store.

use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hclaudit_config::DataConfig;
use hclaudit_core::DataError;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::check;
use crate::table::Table;

/// Where one matrix comes from and how it is labelled in the prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixSource {
    pub label: String,
    pub path: PathBuf,
}

/// A loaded matrix.
#[derive(Debug, Clone)]
pub struct Matrix {
    pub label: String,
    pub path: PathBuf,
    pub table: Table,
}

/// The labelled text of every matrix, concatenated in source order.
///
/// Cheap to clone; clones share the same allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixContext(Arc<str>);

impl MatrixContext {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether both handles point at the same memoised text.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for MatrixContext {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatrixContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct Loaded {
    matrices: Vec<Matrix>,
    context: MatrixContext,
}

/// Loads matrix tables on first use and serves the cached result afterwards.
///
/// Failed loads are not cached: the next call reads the files again.
/// There is no file watching; a new store is needed to pick up edits.
pub struct MatrixStore {
    sources: Vec<MatrixSource>,
    loaded: OnceCell<Loaded>,
    reads: AtomicUsize,
}

impl MatrixStore {
    pub fn new(sources: Vec<MatrixSource>) -> Self {
        Self {
            sources,
            loaded: OnceCell::new(),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn from_config(data: &DataConfig) -> Self {
        Self::new(
            data.matrices
                .iter()
                .map(|m| MatrixSource {
                    label: m.label.clone(),
                    path: data.dir.join(&m.file),
                })
                .collect(),
        )
    }

    pub fn sources(&self) -> &[MatrixSource] {
        &self.sources
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|s| s.path.clone()).collect()
    }

    /// The combined matrix text. Reads the files only on the first
    /// successful call.
    pub async fn load(&self) -> Result<MatrixContext, DataError> {
        Ok(self.loaded().await?.context.clone())
    }

    /// The parsed matrices, in source order.
    pub async fn matrices(&self) -> Result<&[Matrix], DataError> {
        Ok(&self.loaded().await?.matrices)
    }

    /// The first `rows` rows of the matrix at `index`.
    pub async fn preview(&self, index: usize, rows: usize) -> Result<Option<Matrix>, DataError> {
        let matrices = self.matrices().await?;
        Ok(matrices.get(index).map(|m| Matrix {
            label: m.label.clone(),
            path: m.path.clone(),
            table: m.table.head(rows),
        }))
    }

    /// Whether the matrices are already cached.
    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    /// How many times the files were actually read.
    pub fn load_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    async fn loaded(&self) -> Result<&Loaded, DataError> {
        self.loaded.get_or_try_init(|| self.read_all()).await
    }

    async fn read_all(&self) -> Result<Loaded, DataError> {
        self.reads.fetch_add(1, Ordering::Relaxed);

        let files = check::verify(&self.paths());
        if !files.ok {
            return Err(DataError::Missing(files.missing));
        }

        let mut matrices = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let table = Table::read(&source.path).await?;
            debug!(
                label = %source.label,
                rows = table.len(),
                columns = table.headers.len(),
                "Matrix parsed"
            );
            matrices.push(Matrix {
                label: source.label.clone(),
                path: source.path.clone(),
                table,
            });
        }

        let context = render_context(&matrices);
        info!(
            matrices = matrices.len(),
            chars = context.len(),
            "Matrix context loaded"
        );

        Ok(Loaded {
            matrices,
            context: MatrixContext(Arc::from(context)),
        })
    }
}

fn render_context(matrices: &[Matrix]) -> String {
    matrices
        .iter()
        .map(|m| format!("{}:\n{}", m.label, m.table.render()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_matrices(dir: &Path) -> DataConfig {
        let data = DataConfig {
            dir: dir.to_path_buf(),
            ..DataConfig::default()
        };
        let paths = data.matrix_paths();
        std::fs::write(&paths[0], "Equipo,Aspecto\nB-110,Emisiones\n").unwrap();
        std::fs::write(&paths[1], "Equipo,Aspecto\nTK-201,Residuos\n").unwrap();
        std::fs::write(&paths[2], "Pregunta,Consecuencia\n¿Y si falla la bomba?,Fuga\n").unwrap();
        data
    }

    #[tokio::test]
    async fn load_is_memoised() {
        let dir = tempfile::tempdir().unwrap();
        let store = MatrixStore::from_config(&write_matrices(dir.path()));
        assert!(!store.is_loaded());

        let first = store.load().await.unwrap();
        let second = store.load().await.unwrap();

        assert!(first.ptr_eq(&second));
        assert_eq!(first, second);
        assert_eq!(store.load_count(), 1);
        assert!(store.is_loaded());
    }

    #[tokio::test]
    async fn cached_context_survives_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_matrices(dir.path());
        let store = MatrixStore::from_config(&data);

        let before = store.load().await.unwrap();
        std::fs::write(&data.matrix_paths()[0], "Equipo\nCAMBIADO\n").unwrap();
        let after = store.load().await.unwrap();

        assert_eq!(before, after);
        assert!(!after.contains("CAMBIADO"));
    }

    #[tokio::test]
    async fn context_is_labelled_in_source_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = MatrixStore::from_config(&write_matrices(dir.path()));
        let ctx = store.load().await.unwrap();

        let m1 = ctx.find("Matriz 1:\n").unwrap();
        let m2 = ctx.find("\n\nMatriz 2:\n").unwrap();
        let wi = ctx.find("\n\nWhat-If:\n").unwrap();
        assert_eq!(m1, 0);
        assert!(m1 < m2 && m2 < wi);
        assert!(ctx.contains("B-110"));
        assert!(ctx.contains("TK-201"));
        assert!(ctx.contains("¿Y si falla la bomba?"));
        assert!(!ctx.ends_with('\n'));
    }

    #[tokio::test]
    async fn missing_file_is_data_unavailable_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_matrices(dir.path());
        let what_if = data.matrix_paths()[2].clone();
        std::fs::remove_file(&what_if).unwrap();

        let store = MatrixStore::from_config(&data);
        match store.load().await {
            Err(DataError::Missing(paths)) => assert_eq!(paths, [what_if.clone()]),
            other => panic!("expected missing data, got {other:?}"),
        }
        assert!(!store.is_loaded());

        std::fs::write(&what_if, "Pregunta\n¿Y si?\n").unwrap();
        assert!(store.load().await.is_ok());
        assert_eq!(store.load_count(), 2);
    }

    #[tokio::test]
    async fn preview_returns_head_of_one_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let store = MatrixStore::from_config(&write_matrices(dir.path()));

        let preview = store.preview(2, 3).await.unwrap().unwrap();
        assert_eq!(preview.label, "What-If");
        assert_eq!(preview.table.len(), 1);
        assert!(store.preview(7, 3).await.unwrap().is_none());
        assert_eq!(store.load_count(), 1);
    }
}
