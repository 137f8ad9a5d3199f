use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MenuError {
    #[error("Category name is required.")]
    BlankCategoryName,
    #[error("Another category already uses the name '{0}'.")]
    CategoryExists(String),
    #[error("Colors must use #RRGGBB format (got '{0}').")]
    InvalidColor(String),
    #[error("Columns must be a number (got '{0}').")]
    InvalidColumns(String),
    #[error("{0} is required.")]
    MissingField(&'static str),
}
