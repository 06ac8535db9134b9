//! The item record shared by every client on a table.

use kurbo::{Point, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable numeric identity of an item.
pub type ItemId = u32;

/// Upper bound (exclusive) for randomly drawn item ids.
pub const ITEM_ID_RANGE: ItemId = 1_000_000;

/// Opaque tag naming the player that claimed an area.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Draw a fresh `"player" + 0..999999` tag for this session.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(format!("player{}", rng.gen_range(0..1_000_000u32)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A card, token or board lying on the table.
///
/// Items carry no pile or selection data: piles are derived from geometry
/// and selection is a local concern of each client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    /// Reference to the visual content, resolved by the front-end.
    pub imgurl: String,
    /// Center in table coordinates.
    pub center: Point,
    /// Multiplier on the natural image size.
    pub scale: f64,
    pub locked: bool,
    pub face_down: bool,
    /// Player that claimed this item as their area. Implies `locked`.
    pub is_player_area: Option<PlayerId>,
}

impl Item {
    /// Create an unlocked, face-up item.
    pub fn new(id: ItemId, imgurl: impl Into<String>, center: Point, scale: f64) -> Self {
        Self {
            id,
            imgurl: imgurl.into(),
            center,
            scale,
            locked: false,
            face_down: false,
            is_player_area: None,
        }
    }

    /// Translate the item; never affects draw order.
    pub fn translate(&mut self, delta: Vec2) {
        self.center += delta;
    }

    /// Whether this area was claimed by `player`.
    pub fn is_area_of(&self, player: &PlayerId) -> bool {
        self.is_player_area.as_ref() == Some(player)
    }
}

/// Draw ids in `0..ITEM_ID_RANGE` until one is not taken.
pub fn fresh_id<R, F>(rng: &mut R, mut is_taken: F) -> ItemId
where
    R: Rng + ?Sized,
    F: FnMut(ItemId) -> bool,
{
    loop {
        let id = rng.gen_range(0..ITEM_ID_RANGE);
        if !is_taken(id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_item_wire_field_names() {
        let mut item = Item::new(7, "card.png", Point::new(1.5, -2.0), 1.0);
        item.is_player_area = Some(PlayerId::new("player42"));
        item.locked = true;
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["imgurl"], "card.png");
        assert_eq!(json["center"]["x"], 1.5);
        assert_eq!(json["center"]["y"], -2.0);
        assert_eq!(json["faceDown"], false);
        assert_eq!(json["isPlayerArea"], "player42");
    }

    #[test]
    fn test_unclaimed_area_is_null() {
        let item = Item::new(1, "a", Point::ZERO, 1.0);
        let json = serde_json::to_value(&item).unwrap();
        assert!(json["isPlayerArea"].is_null());
    }

    #[test]
    fn test_fresh_id_skips_taken() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut draws = 0;
        let id = fresh_id(&mut rng, |_| {
            draws += 1;
            draws < 4
        });
        assert_eq!(draws, 4);
        assert!(id < ITEM_ID_RANGE);
    }

    #[test]
    fn test_random_player_id_prefix() {
        let mut rng = StdRng::seed_from_u64(9);
        let player = PlayerId::random(&mut rng);
        assert!(player.as_str().starts_with("player"));
        assert!(player.as_str()["player".len()..].parse::<u32>().unwrap() < 1_000_000);
    }
}
