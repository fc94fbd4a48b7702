pub const DEFAULT_MAX_PAGE_SIZE: usize = 500;
pub const DEFAULT_PAGE_SIZE: usize = 250;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcConfig {
    /// Largest page a paginated request may ask for.
    pub max_page_size: usize,
    /// Page size used when a request leaves it at zero.
    pub default_page_size: usize,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
