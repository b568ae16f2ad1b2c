//! Context-menu model.
//!
//! Menu items are a pure rendering of [`Settings`]. Whatever draws the menu
//! owns the widgets; this module only says which items exist, which one is
//! checked, and what selecting one writes back to storage.

use serde::Serialize;

use crate::settings::{SettingKey, Settings, SettingsPatch, SettingsUpdate};

pub const FAMILY_PARENT_ID: &str = "mathFontFamily";
pub const SCALE_PARENT_ID: &str = "mathFontScale";
pub const FAMILY_DEFAULT_ID: &str = "mathFontFamily_default";

/// Half-octave steps either side of 100%.
const SCALE_STEPS: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuItemKind {
    Normal,
    Radio,
}

/// Item title: either a localized message name or literal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MenuTitle {
    Message(&'static str),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: String,
    pub parent_id: Option<&'static str>,
    pub kind: MenuItemKind,
    pub title: MenuTitle,
    pub checked: bool,
    /// Storage write performed when the item is selected.
    pub on_select: Option<SettingsPatch>,
}

/// What a menu has to redo after the record changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuRefresh {
    /// The family list itself changed: drop `stale_ids`, then recreate the
    /// family items from the current record.
    RebuildFamilies { stale_ids: Vec<String> },
    UpdateFamilyChecks,
    UpdateScaleChecks,
}

/// Scale percentages offered in the menu: `round(100 * 2^(i/4))`, i in [-4, 4].
pub fn scale_factors() -> Vec<i64> {
    (-SCALE_STEPS..=SCALE_STEPS)
        .map(|i| (100.0 * 2f64.powf(f64::from(i) / f64::from(SCALE_STEPS))).round() as i64)
        .collect()
}

/// Split the stored comma-separated list into trimmed, non-empty names.
pub fn font_family_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// Ids of the family radio items derived from `list`, default item included.
pub fn family_item_ids(list: &str) -> Vec<String> {
    let count = font_family_names(list).len();
    std::iter::once(FAMILY_DEFAULT_ID.to_string())
        .chain((0..count).map(|i| format!("{FAMILY_PARENT_ID}_{i}")))
        .collect()
}

pub fn font_family_items(settings: &Settings) -> Vec<MenuItem> {
    let mut items = vec![MenuItem {
        id: FAMILY_DEFAULT_ID.to_string(),
        parent_id: Some(FAMILY_PARENT_ID),
        kind: MenuItemKind::Radio,
        title: MenuTitle::Message(FAMILY_DEFAULT_ID),
        checked: settings.math_font_family.is_empty(),
        on_select: Some(SettingsPatch::family("")),
    }];

    for (i, name) in font_family_names(&settings.math_font_family_list)
        .into_iter()
        .enumerate()
    {
        items.push(MenuItem {
            id: format!("{FAMILY_PARENT_ID}_{i}"),
            parent_id: Some(FAMILY_PARENT_ID),
            kind: MenuItemKind::Radio,
            checked: settings.math_font_family == name,
            on_select: Some(SettingsPatch::family(name.clone())),
            title: MenuTitle::Text(name),
        });
    }
    items
}

pub fn font_scale_items(settings: &Settings) -> Vec<MenuItem> {
    scale_factors()
        .into_iter()
        .enumerate()
        .map(|(i, scale)| MenuItem {
            id: format!("{SCALE_PARENT_ID}_{i}"),
            parent_id: Some(SCALE_PARENT_ID),
            kind: MenuItemKind::Radio,
            title: MenuTitle::Text(format!("{scale}%")),
            checked: settings.math_font_scale == scale,
            on_select: Some(SettingsPatch::scale(scale)),
        })
        .collect()
}

/// The whole menu: both parents, each followed by its children.
pub fn build_menu(settings: &Settings) -> Vec<MenuItem> {
    let mut items = vec![parent(FAMILY_PARENT_ID, "mathFontFamily_title")];
    items.extend(font_family_items(settings));
    items.push(parent(SCALE_PARENT_ID, "mathFontScale_title"));
    items.extend(font_scale_items(settings));
    items
}

/// Work needed to bring a rendered menu in line with `update.current`.
pub fn refresh_for(update: &SettingsUpdate) -> Vec<MenuRefresh> {
    let mut refresh = Vec::new();
    if update.touches(SettingKey::MathFontFamilyList) {
        refresh.push(MenuRefresh::RebuildFamilies {
            stale_ids: family_item_ids(&update.previous.math_font_family_list),
        });
    } else if update.touches(SettingKey::MathFontFamily) {
        refresh.push(MenuRefresh::UpdateFamilyChecks);
    }
    if update.touches(SettingKey::MathFontScale) {
        refresh.push(MenuRefresh::UpdateScaleChecks);
    }
    refresh
}

fn parent(id: &'static str, message: &'static str) -> MenuItem {
    MenuItem {
        id: id.to_string(),
        parent_id: None,
        kind: MenuItemKind::Normal,
        title: MenuTitle::Message(message),
        checked: false,
        on_select: None,
    }
}
