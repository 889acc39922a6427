//! Shared UI icons and emojis.
//!
//! Each icon carries a plain-text fallback used when the terminal cannot
//! render emoji.

use console::Emoji;

// Attempt outcomes
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "[SKIP]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");

// Phase outlook
pub static DONE: Emoji<'_, '_> = Emoji("🏅 ", "[DONE]");
pub static READY: Emoji<'_, '_> = Emoji("▶️  ", "[>]");
pub static BLOCKER: Emoji<'_, '_> = Emoji("🚧 ", "[BLOCK]");
pub static MANUAL: Emoji<'_, '_> = Emoji("✋ ", "[HAND]");

// Misc
pub static PROGRESS: Emoji<'_, '_> = Emoji("📊 ", "[PROG]");
pub static CLOCK: Emoji<'_, '_> = Emoji("⏱️  ", "[T]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!]");
