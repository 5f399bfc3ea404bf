//! Fixed colour and icon palettes. Entries pick `COLORS[i % 15]` and
//! `ICONS[i % 12]`, so titles and colours stay distinct up to those counts.

pub const COLORS: [&str; 15] = [
    "#FF5722", "#FF9800", "#FFC107", "#FFEB3B", "#CDDC39", "#8BC34A", "#4CAF50", "#009688",
    "#00BCD4", "#03A9F4", "#2196F3", "#3F51B5", "#1E90FF", "#FF69B4", "#FF8C00",
];

pub const ICONS: [&str; 12] = [
    "🌟", "🔮", "🚀", "🌈", "⚡", "🔥", "💎", "🌊", "🔶", "🔷", "🚩", "⭐",
];

pub fn color_for(index: usize) -> &'static str {
    COLORS[index % COLORS.len()]
}

pub fn icon_for(index: usize) -> &'static str {
    ICONS[index % ICONS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_cycle() {
        assert_eq!(color_for(15), COLORS[0]);
        assert_eq!(icon_for(15), ICONS[3]);
        assert_eq!(icon_for(12), "🌟");
    }
}
