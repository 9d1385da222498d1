use drupal_lsp_index::IndexError;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("invalid trigger expression: {0}")]
    Regex(#[from] regex::Error),
}
