//! # Taskboard App Library
//!
//! Presentation layer of the task board: the three views over a board
//! snapshot, the persisted view-mode preference and the demo board.
//!
//! ## Modules
//!
//! - `views`: Kanban, Eisenhower matrix and table transforms
//! - `preferences`: View-mode preference stored in a file
//! - `demo`: Demo board data and in-memory seeding
//! - `startup`: Opening the user's first board
//!
//! ## Example
//!
//! ```
//! use taskboard_app::demo;
//! use taskboard_app::preferences::ViewMode;
//! use taskboard_app::views;
//!
//! let (columns, tasks) = demo::board_state();
//! let text = views::render(ViewMode::Matrix, &columns, &tasks);
//! assert!(text.contains("Do First"));
//! ```

pub mod demo;
pub mod preferences;
pub mod startup;
pub mod views;
