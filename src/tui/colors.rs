//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Status;

// Column accents mirror the web app's board tints.

/// Used for Not started
pub const SLATE: Color = Color::Rgb(100, 116, 139);
/// Used for In progress
pub const AZURE: Color = Color::Rgb(59, 130, 246);
/// Used for Planned by me
pub const VIOLET: Color = Color::Rgb(139, 92, 246);
/// Used for Done
pub const MOSS: Color = Color::Rgb(34, 160, 94);
/// Used for Archived
pub const ASH: Color = Color::Rgb(120, 113, 108);

/// Accent color for a status column.
pub fn status_color(status: Status) -> Color {
    match status {
        Status::NotStarted => SLATE,
        Status::InProgress => AZURE,
        Status::PlannedByMe => VIOLET,
        Status::Done => MOSS,
        Status::Archived => ASH,
    }
}
