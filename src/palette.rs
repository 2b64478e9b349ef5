//! Sequential ColorBrewer palettes for choropleth classes.
//!
//! Each ramp is the 9-class variant; fewer classes are picked evenly from it.

pub const MIN_CLASSES: usize = 2;
pub const MAX_CLASSES: usize = 9;

pub const YLORRD: &[&str] = &[
    "#ffffcc", "#ffeda0", "#fed976", "#feb24c", "#fd8d3c",
    "#fc4e2a", "#e31a1c", "#bd0026", "#800026",
];

pub const YLORBR: &[&str] = &[
    "#ffffe5", "#fff7bc", "#fee391", "#fec44f", "#fe9929",
    "#ec7014", "#cc4c02", "#993404", "#662506",
];

pub const YLGN: &[&str] = &[
    "#ffffe5", "#f7fcb9", "#d9f0a3", "#addd8e", "#78c679",
    "#41ab5d", "#238443", "#006837", "#004529",
];

pub const YLGNBU: &[&str] = &[
    "#ffffd9", "#edf8b1", "#c7e9b4", "#7fcdbb", "#41b6c4",
    "#1d91c0", "#225ea8", "#253494", "#081d58",
];

pub const ORRD: &[&str] = &[
    "#fff7ec", "#fee8c8", "#fdd49e", "#fdbb84", "#fc8d59",
    "#ef6548", "#d7301f", "#b30000", "#7f0000",
];

pub const BUPU: &[&str] = &[
    "#f7fcfd", "#e0ecf4", "#bfd3e6", "#9ebcda", "#8c96c6",
    "#8c6bb1", "#88419d", "#810f7c", "#4d004b",
];

pub const PUBU: &[&str] = &[
    "#fff7fb", "#ece7f2", "#d0d1e6", "#a6bddb", "#74a9cf",
    "#3690c0", "#0570b0", "#045a8d", "#023858",
];

pub const GNBU: &[&str] = &[
    "#f7fcf0", "#e0f3db", "#ccebc5", "#a8ddb5", "#7bccc4",
    "#4eb3d3", "#2b8cbe", "#0868ac", "#084081",
];

pub const RDPU: &[&str] = &[
    "#fff7f3", "#fde0dd", "#fcc5c0", "#fa9fb5", "#f768a1",
    "#dd3497", "#ae017e", "#7a0177", "#49006a",
];

pub const BLUES: &[&str] = &[
    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6",
    "#4292c6", "#2171b5", "#08519c", "#08306b",
];

pub const GREENS: &[&str] = &[
    "#f7fcf5", "#e5f5e0", "#c7e9c0", "#a1d99b", "#74c476",
    "#41ab5d", "#238b45", "#006d2c", "#00441b",
];

pub const REDS: &[&str] = &[
    "#fff5f0", "#fee0d2", "#fcbba1", "#fc9272", "#fb6a4a",
    "#ef3b2c", "#cb181d", "#a50f15", "#67000d",
];

pub const ORANGES: &[&str] = &[
    "#fff5eb", "#fee6ce", "#fdd0a2", "#fdae6b", "#fd8d3c",
    "#f16913", "#d94801", "#a63603", "#7f2704",
];

pub const PURPLES: &[&str] = &[
    "#fcfbfd", "#efedf5", "#dadaeb", "#bcbddc", "#9e9ac8",
    "#807dba", "#6a51a3", "#54278f", "#3f007d",
];

pub const GREYS: &[&str] = &[
    "#ffffff", "#f0f0f0", "#d9d9d9", "#bdbdbd", "#969696",
    "#737373", "#525252", "#252525", "#000000",
];

/// Look up a palette by name, case-insensitively (`"YlOrRd"`, `"ylorrd"`).
pub fn get_palette(name: &str) -> Option<&'static [&'static str]> {
    match name.to_lowercase().as_str() {
        "ylorrd" => Some(YLORRD),
        "ylorbr" => Some(YLORBR),
        "ylgn" => Some(YLGN),
        "ylgnbu" => Some(YLGNBU),
        "orrd" => Some(ORRD),
        "bupu" => Some(BUPU),
        "pubu" => Some(PUBU),
        "gnbu" => Some(GNBU),
        "rdpu" => Some(RDPU),
        "blues" => Some(BLUES),
        "greens" => Some(GREENS),
        "reds" => Some(REDS),
        "oranges" => Some(ORANGES),
        "purples" => Some(PURPLES),
        "greys" | "grays" => Some(GREYS),
        _ => None,
    }
}

/// `count` colours spread evenly from the light to the dark end of the ramp.
pub fn sample(palette: &[&'static str], count: usize) -> Vec<&'static str> {
    match count {
        0 => Vec::new(),
        1 => vec![palette[palette.len() / 2]],
        _ => {
            let last = (palette.len() - 1) as f64;
            (0..count)
                .map(|i| {
                    let idx = (i as f64 * last / (count - 1) as f64).round() as usize;
                    palette[idx]
                })
                .collect()
        }
    }
}
