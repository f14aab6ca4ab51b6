use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::client::{ApiClient, RetryPolicy, Transport, TOO_MANY_REQUESTS};
use crate::config::{COMBAT_PAGE_DELAY, POKEMON_PAGE_DELAY, TRANSIENT_RETRY_DELAY};
use crate::error::Result;
use crate::types::{CombatPage, CreatureDetail, CreatureSummary, PokemonPage, RawCombat};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DetailStats {
    pub requested: usize,
    pub fetched: usize,
    pub skipped: usize,
    /// Individual 429 replies seen, across all creatures.
    pub rate_limited: usize,
}

fn page_query(page: u64, per_page: u32) -> [(&'static str, String); 2] {
    [("page", page.to_string()), ("per_page", per_page.to_string())]
}

/// Walk `/combats` until the server-reported total is covered or a page comes
/// back empty. A failed page ends the walk; whatever was collected before it
/// is returned.
pub async fn fetch_combats<T: Transport>(client: &ApiClient<T>, per_page: u32) -> Vec<RawCombat> {
    let mut combats = Vec::new();
    let mut page: u64 = 1;

    loop {
        let context = format!("combats page {page}");
        let data: CombatPage = match client
            .get_json("/combats", &page_query(page, per_page), &context)
            .await
        {
            Ok(d) => d,
            Err(e) => {
                warn!(page, "Failed to fetch {context}: {e}");
                break;
            }
        };

        let received = data.combats.len();
        combats.extend(data.combats);
        debug!(page, received, total = data.total, "combats page received");

        if page * u64::from(per_page) >= data.total || received == 0 {
            break;
        }
        page += 1;
        sleep(COMBAT_PAGE_DELAY).await;
    }

    info!(count = combats.len(), "Combat extraction complete: {} combats", combats.len());
    combats
}

/// Walk `/pokemon`. The first page fixes the page count. A page that stays
/// rate limited is skipped; any other failure discards the whole list.
pub async fn fetch_pokemon_list<T: Transport>(
    client: &ApiClient<T>,
    per_page: u32,
) -> Vec<CreatureSummary> {
    match try_fetch_pokemon_list(client, per_page).await {
        Ok(list) => {
            info!(count = list.len(), "Pokemon list extraction complete: {} pokemon", list.len());
            list
        }
        Err(e) => {
            warn!("Pokemon list extraction failed: {e}");
            Vec::new()
        }
    }
}

async fn try_fetch_pokemon_list<T: Transport>(
    client: &ApiClient<T>,
    per_page: u32,
) -> Result<Vec<CreatureSummary>> {
    let first: PokemonPage = client
        .get_json("/pokemon", &page_query(1, per_page), "pokemon page 1")
        .await?;

    let reported_total = first.total;
    let mut creatures = first.into_items();
    let total = reported_total.unwrap_or(creatures.len() as u64);
    let total_pages = total.div_ceil(u64::from(per_page));
    info!(total, total_pages, "API reported {total} pokemon across {total_pages} pages");

    for page in 2..=total_pages {
        sleep(POKEMON_PAGE_DELAY).await;
        info!("Fetching pokemon page {page}/{total_pages}");

        let context = format!("pokemon page {page}");
        match client
            .get_json::<PokemonPage>("/pokemon", &page_query(page, per_page), &context)
            .await
        {
            Ok(data) => creatures.extend(data.into_items()),
            Err(e) if e.is_rate_limited() => {
                warn!(page, "Skipping {context}: {e}");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(creatures)
}

/// One `GET /pokemon/{id}` per creature, in list order. Each creature gets its
/// own retry budget; one that exhausts it, or whose 2xx body cannot be decoded,
/// is left out of the result.
pub async fn fetch_pokemon_details<T: Transport>(
    client: &ApiClient<T>,
    creatures: &[CreatureSummary],
) -> (Vec<CreatureDetail>, DetailStats) {
    let policy = client.retry_policy();
    let total = creatures.len();
    let mut details = Vec::with_capacity(total);
    let mut stats = DetailStats {
        requested: total,
        ..DetailStats::default()
    };

    for (idx, creature) in creatures.iter().enumerate() {
        let id = creature.id.to_string();
        match fetch_one_detail(client, &id, policy, &mut stats).await {
            Some(detail) => {
                details.push(detail);
                stats.fetched += 1;
            }
            None => {
                warn!(id = %id, "Skipping pokemon {id}");
                stats.skipped += 1;
            }
        }
        info!(
            "{}/{} pokemon extracted: {}",
            idx + 1,
            total,
            creature.name.as_deref().unwrap_or("?")
        );
    }

    info!(
        requested = stats.requested,
        fetched = stats.fetched,
        skipped = stats.skipped,
        rate_limited = stats.rate_limited,
        "Detail extraction complete: {} of {} pokemon",
        stats.fetched,
        stats.requested,
    );
    (details, stats)
}

async fn fetch_one_detail<T: Transport>(
    client: &ApiClient<T>,
    id: &str,
    policy: RetryPolicy,
    stats: &mut DetailStats,
) -> Option<CreatureDetail> {
    let path = format!("/pokemon/{id}");

    for attempt in 0..policy.max_attempts {
        match client.send_once(&path, &[]).await {
            Ok(reply) if reply.status == TOO_MANY_REQUESTS => {
                stats.rate_limited += 1;
                let wait = policy.delay_for(attempt);
                warn!(id, "Rate limited on pokemon {id}, waiting {}s", wait.as_secs_f64());
                sleep(wait).await;
                continue;
            }
            Ok(reply) if reply.is_success() => {
                // Decode failures are not retried.
                return match reply.json::<CreatureDetail>() {
                    Ok(detail) => Some(detail),
                    Err(e) => {
                        warn!(id, "Malformed details for pokemon {id}: {e}");
                        None
                    }
                };
            }
            Ok(reply) => warn!(id, status = reply.status, "Pokemon {id} details returned HTTP {}", reply.status),
            Err(e) => warn!(id, "Error fetching pokemon {id} details: {e}"),
        }
        sleep(TRANSIENT_RETRY_DELAY).await;
    }

    None
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::client::testing::{client, ok, status, ScriptedTransport};
    use crate::client::HttpRequest;

    fn page_of(req: &HttpRequest) -> u64 {
        req.query_value("page").unwrap().parse().unwrap()
    }

    fn pages_requested(transport: &ScriptedTransport) -> Vec<u64> {
        transport.requests().iter().map(page_of).collect()
    }

    fn pokemon_items(ids: std::ops::Range<u64>) -> String {
        let items: Vec<String> = ids
            .map(|id| format!(r#"{{"id": {id}, "name": "mon{id}"}}"#))
            .collect();
        items.join(",")
    }

    #[tokio::test(start_paused = true)]
    async fn pokemon_list_stops_after_last_computed_page() {
        let transport = ScriptedTransport::routed(|req, _| {
            let page = page_of(req);
            let start = (page - 1) * 10 + 1;
            let end = (start + 10).min(26);
            ok(&format!(r#"{{"total": 25, "items": [{}]}}"#, pokemon_items(start..end)))
        });
        let client = client(transport);

        let list = fetch_pokemon_list(&client, 10).await;
        assert_eq!(list.len(), 25);
        assert_eq!(pages_requested(client.transport()), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn pokemon_list_total_falls_back_to_item_count() {
        let transport = ScriptedTransport::routed(|_, _| {
            ok(&format!(r#"{{"pokemons": [{}]}}"#, pokemon_items(1..4)))
        });
        let client = client(transport);

        let list = fetch_pokemon_list(&client, 50).await;
        assert_eq!(list.len(), 3);
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pokemon_list_paces_pages() {
        let transport = ScriptedTransport::routed(|_, _| ok(r#"{"total": 20, "items": []}"#));
        let client = client(transport);

        fetch_pokemon_list(&client, 10).await;
        let times = client.transport().instants();
        assert_eq!(times.len(), 2);
        assert!(times[1] - times[0] >= Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_pokemon_page_is_skipped() {
        let transport = ScriptedTransport::routed(|req, _| match page_of(req) {
            2 => status(429),
            p => {
                let start = (p - 1) * 10 + 1;
                ok(&format!(r#"{{"total": 30, "items": [{}]}}"#, pokemon_items(start..start + 10)))
            }
        });
        let client = client(transport);

        let list = fetch_pokemon_list(&client, 10).await;
        assert_eq!(list.len(), 20);
        assert_eq!(pages_requested(client.transport()), vec![1, 2, 2, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn pokemon_list_failure_discards_everything() {
        let transport = ScriptedTransport::routed(|req, _| match page_of(req) {
            1 => ok(&format!(r#"{{"total": 30, "items": [{}]}}"#, pokemon_items(1..11))),
            _ => status(500),
        });
        let client = client(transport);

        assert!(fetch_pokemon_list(&client, 10).await.is_empty());
        assert_eq!(pages_requested(client.transport()), vec![1, 2]);
    }

    fn combat_json(first: u64, second: u64, winner: u64) -> String {
        format!(r#"{{"first_pokemon": {first}, "second_pokemon": {second}, "winner": {winner}}}"#)
    }

    #[tokio::test(start_paused = true)]
    async fn combats_stop_when_total_is_covered() {
        let transport = ScriptedTransport::routed(|_, _| {
            let rows = vec![combat_json(1, 2, 1); 10].join(",");
            ok(&format!(r#"{{"total": 25, "combats": [{rows}]}}"#))
        });
        let client = client(transport);

        let combats = fetch_combats(&client, 10).await;
        assert_eq!(combats.len(), 30);
        assert_eq!(pages_requested(client.transport()), vec![1, 2, 3]);

        let times = client.transport().instants();
        assert!(times[1] - times[0] >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn combats_stop_on_empty_page() {
        let transport = ScriptedTransport::routed(|req, _| match page_of(req) {
            1 => ok(&format!(r#"{{"total": 100, "combats": [{}]}}"#, combat_json(1, 2, 2))),
            _ => ok(r#"{"total": 100, "combats": []}"#),
        });
        let client = client(transport);

        assert_eq!(fetch_combats(&client, 1).await.len(), 1);
        assert_eq!(pages_requested(client.transport()), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn combats_failure_keeps_earlier_pages() {
        let transport = ScriptedTransport::routed(|req, _| match page_of(req) {
            1 => ok(&format!(r#"{{"total": 20, "combats": [{}]}}"#, combat_json(3, 4, 4))),
            _ => status(502),
        });
        let client = client(transport);

        let combats = fetch_combats(&client, 1).await;
        assert_eq!(combats.len(), 1);
        assert_eq!(pages_requested(client.transport()), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_pages_are_not_deduplicated() {
        let transport = ScriptedTransport::routed(|_, _| {
            ok(&format!(r#"{{"total": 2, "combats": [{}]}}"#, combat_json(1, 2, 1)))
        });
        let client = client(transport);

        let combats = fetch_combats(&client, 1).await;
        assert_eq!(combats.len(), 2);
        assert_eq!(combats[0], combats[1]);
    }

    fn summaries(ids: &[i64]) -> Vec<CreatureSummary> {
        ids.iter()
            .map(|&id| CreatureSummary {
                id: id.into(),
                name: Some(format!("mon{id}")),
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn detail_retries_then_skips_exhausted_creature() {
        let transport = ScriptedTransport::routed(|req, _| {
            if req.url.ends_with("/pokemon/2") {
                status(429)
            } else {
                ok(r#"{"id": 1, "name": "mon1", "speed": 45, "types": "grass"}"#)
            }
        });
        let client = client(transport);

        let (details, stats) = fetch_pokemon_details(&client, &summaries(&[1, 2])).await;
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].speed, Some(45));
        assert_eq!(
            stats,
            DetailStats { requested: 2, fetched: 1, skipped: 1, rate_limited: 3 }
        );
        assert_eq!(client.transport().requests().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn detail_recovers_from_transient_error() {
        let transport = ScriptedTransport::routed(|_, n| match n {
            0 => Err(crate::error::AppError::Transport("connection reset".into())),
            1 => status(500),
            _ => ok(r#"{"id": "9", "name": "mon9"}"#),
        });
        let client = client(transport);

        let (details, stats) = fetch_pokemon_details(&client, &summaries(&[9])).await;
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].id, 9);
        assert_eq!(stats.skipped, 0);

        let times = client.transport().instants();
        assert!(times[1] - times[0] >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn detail_stats_in_other_number_formats_are_kept() {
        let transport = ScriptedTransport::routed(|req, _| {
            if req.url.ends_with("/pokemon/1") {
                ok(r#"{"id": 1, "name": "mon1", "attack": 60.0, "types": "fire"}"#)
            } else {
                ok(r#"{"id": 2, "name": "mon2", "attack": "40", "legendary": 0}"#)
            }
        });
        let client = client(transport);

        let (details, stats) = fetch_pokemon_details(&client, &summaries(&[1, 2])).await;
        assert_eq!(stats.fetched, 2);
        assert_eq!(stats.skipped, 0);
        assert_eq!(details[0].attack, Some(60));
        assert_eq!(details[1].attack, Some(40));
        assert_eq!(details[1].legendary, Some(false));
        assert_eq!(client.transport().requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_detail_body_is_skipped_without_retry() {
        let transport = ScriptedTransport::routed(|_, _| ok(r#"{"name": "no id here"}"#));
        let client = client(transport);

        let (details, stats) = fetch_pokemon_details(&client, &summaries(&[5])).await;
        assert!(details.is_empty());
        assert_eq!(stats.skipped, 1);
        assert_eq!(client.transport().requests().len(), 1);
    }
}
