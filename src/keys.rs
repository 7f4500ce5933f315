//! Cache keys used by the catalog and recommendation clients.
//!
//! Keys are caller keys; the store adds its own namespace prefix.

use crate::library::GameId;

/// Top-rated games list.
pub const TOP_GAMES: &str = "topGames";

/// Recently released games list.
pub const NEW_GAMES: &str = "newGames";

/// Prefix shared by every search result entry.
pub const SEARCH_PREFIX: &str = "search_";

/// Prefix shared by every library detail blob.
pub const GAME_DATA_PREFIX: &str = "gameData_";

/// Prefix shared by every memoized recommendation result.
pub const RECOMMENDATIONS_PREFIX: &str = "recommendations_";

/// Key for a catalog search, normalized so that case and spacing variants
/// of a query share one entry. Blank queries have no key.
pub fn search(query: &str) -> Option<String> {
    let normalized = query.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    let joined = normalized.split_whitespace().collect::<Vec<_>>().join("_");
    Some(format!("{}{}", SEARCH_PREFIX, joined))
}

/// Key of the detail blob paired with a library member.
pub fn game_data(id: GameId) -> String {
    format!("{}{}", GAME_DATA_PREFIX, id)
}

/// Key of the recommendations computed for a library under `model`.
///
/// The library part is the sum of the ids, so it changes whenever the
/// library does and old results are only reachable through
/// `RECOMMENDATIONS_PREFIX`.
pub fn recommendations<'a>(ids: impl IntoIterator<Item = &'a GameId>, model: &str) -> String {
    let sum = ids.into_iter().fold(0i64, |acc, id| acc.wrapping_add(*id));
    format!("{}{}_{}", RECOMMENDATIONS_PREFIX, sum, model)
}
