//! Shared UI icons and emojis.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");

// Phase indicators
pub static PACKAGE: Emoji<'_, '_> = Emoji("📦 ", "[+]");
pub static HAMMER: Emoji<'_, '_> = Emoji("🔨 ", "[>]");
pub static CLOCK: Emoji<'_, '_> = Emoji("⏱️  ", "[T]");
