/// Block categories and well-known block names used across the content tree.
/// These mirror the names course authoring tools write into the store.

// Block categories
pub const COURSE_CATEGORY: &str = "course";
pub const ABOUT_CATEGORY: &str = "about";
pub const COURSE_INFO_CATEGORY: &str = "course_info";
pub const STATIC_TAB_CATEGORY: &str = "static_tab";

/// Block id of the course root inside its own course
pub const COURSE_ROOT_BLOCK_ID: &str = "course";

/// Categories that live at course level without being anyone's child.
/// They are never reported as orphans.
pub const ROOT_SINGLETON_CATEGORIES: [&str; 4] = [
    COURSE_CATEGORY,
    ABOUT_CATEGORY,
    COURSE_INFO_CATEGORY,
    STATIC_TAB_CATEGORY,
];

// Well-known block names
pub const ABOUT_OVERVIEW: &str = "overview";
pub const ABOUT_VIDEO: &str = "video";
pub const COURSE_INFO_UPDATES: &str = "updates";

/// Tab type for custom course pages
pub const STATIC_TAB_TYPE: &str = "static_tab";

/// Mode used when an enrollment request does not name one
pub const DEFAULT_COURSE_MODE: &str = "honor";

/// Header carrying the server API key
pub const API_KEY_HEADER: &str = "x-edx-api-key";

/// Course-level resources advertised by the course detail payload, in order
pub const COURSE_RESOURCES: [&str; 4] = ["content", "overview", "updates", "static_tabs"];

/// Returns true if blocks of this category are allowed to exist without a parent
pub fn is_root_singleton(category: &str) -> bool {
    ROOT_SINGLETON_CATEGORIES.contains(&category)
}
