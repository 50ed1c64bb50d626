// src/services/rate_card_service.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RateCardRepository,
    models::rates::{RateCard, RateType},
};

// Resolve a tarifa horária vigente de um funcionário. Usado SOMENTE para
// sugerir um custo padrão na entrada de dados. O rollup nunca passa por
// aqui: o valor salvo no registro é o que vale.
#[derive(Clone)]
pub struct RateCardService {
    repo: RateCardRepository,
}

impl RateCardService {
    pub fn new(repo: RateCardRepository) -> Self {
        Self { repo }
    }

    /// Cartão vigente para (usuário, tipo de tarifa) em `at_time`, ou None.
    /// Ausência NÃO é erro: o chamador trata como "sem sugestão de custo"
    /// e a entrada de dados segue normalmente.
    pub async fn resolve<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        rate_type: RateType,
        at_time: DateTime<Utc>,
    ) -> Result<Option<RateCard>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cards = self.repo.get_active_cards(executor, user_id, rate_type).await?;
        Ok(pick_effective(&cards, at_time).cloned())
    }

    /// Custo sugerido para uma duração em minutos: tarifa * minutos / 60,
    /// arredondado a centavos.
    pub fn cost_for_duration(card: &RateCard, duration_minutes: i32) -> Decimal {
        (card.hourly_rate * Decimal::from(duration_minutes) / Decimal::from(60)).round_dp(2)
    }

    pub async fn create_card<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        rate_type: RateType,
        hourly_rate: Decimal,
        effective_from: DateTime<Utc>,
        effective_until: Option<DateTime<Utc>>,
    ) -> Result<RateCard, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .create(executor, user_id, rate_type, hourly_rate, effective_from, effective_until)
            .await
    }

    pub async fn list_for_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
    ) -> Result<Vec<RateCard>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_by_user(executor, user_id).await
    }
}

/// Seleção determinística entre cartões com janelas possivelmente
/// sobrepostas: vale a janela `[effective_from, effective_until)` que
/// contém `at_time`; empates resolvem pelo maior `effective_from`, depois
/// `created_at`, depois `id`.
pub fn pick_effective(cards: &[RateCard], at_time: DateTime<Utc>) -> Option<&RateCard> {
    cards
        .iter()
        .filter(|card| {
            card.is_active
                && card.effective_from <= at_time
                && card.effective_until.map(|until| at_time < until).unwrap_or(true)
        })
        .max_by_key(|card| (card.effective_from, card.created_at, card.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn card(
        from: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
        rate: &str,
        is_active: bool,
    ) -> RateCard {
        RateCard {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            rate_type: RateType::Installation,
            hourly_rate: rate.parse().unwrap(),
            effective_from: from,
            effective_until: until,
            is_active,
            created_at: from,
        }
    }

    #[test]
    fn no_matching_window_returns_none() {
        let cards = vec![card(at(2026, 1, 1), Some(at(2026, 2, 1)), "60.00", true)];
        assert!(pick_effective(&cards, at(2026, 3, 1)).is_none());
        assert!(pick_effective(&[], at(2026, 3, 1)).is_none());
    }

    #[test]
    fn open_ended_window_matches_any_later_instant() {
        let cards = vec![card(at(2026, 1, 1), None, "60.00", true)];
        let picked = pick_effective(&cards, at(2030, 6, 15)).unwrap();
        assert_eq!(picked.hourly_rate, "60.00".parse().unwrap());
    }

    #[test]
    fn effective_until_is_exclusive() {
        let until = at(2026, 2, 1);
        let cards = vec![card(at(2026, 1, 1), Some(until), "60.00", true)];
        assert!(pick_effective(&cards, until).is_none());
    }

    #[test]
    fn overlapping_windows_prefer_latest_effective_from() {
        let older = card(at(2026, 1, 1), None, "55.00", true);
        let newer = card(at(2026, 3, 1), None, "65.00", true);
        let cards = vec![older, newer];

        let picked = pick_effective(&cards, at(2026, 6, 1)).unwrap();
        assert_eq!(picked.hourly_rate, "65.00".parse().unwrap());

        // Antes da vigência do mais novo, vale o antigo.
        let picked = pick_effective(&cards, at(2026, 2, 1)).unwrap();
        assert_eq!(picked.hourly_rate, "55.00".parse().unwrap());
    }

    #[test]
    fn inactive_cards_are_ignored() {
        let cards = vec![card(at(2026, 1, 1), None, "60.00", false)];
        assert!(pick_effective(&cards, at(2026, 2, 1)).is_none());
    }

    #[test]
    fn suggested_cost_is_rate_times_minutes_over_sixty() {
        let c = card(at(2026, 1, 1), None, "66.00", true);
        assert_eq!(RateCardService::cost_for_duration(&c, 90), "99.00".parse().unwrap());
        assert_eq!(RateCardService::cost_for_duration(&c, 0), Decimal::ZERO);

        // Arredonda a centavos: 50.00 * 25 / 60 = 20.8333...
        let c = card(at(2026, 1, 1), None, "50.00", true);
        assert_eq!(RateCardService::cost_for_duration(&c, 25), "20.83".parse().unwrap());
    }

    #[test]
    fn full_tie_breaks_on_id_deterministically() {
        let from = at(2026, 1, 1);
        let mut a = card(from, None, "50.00", true);
        let mut b = card(from, None, "70.00", true);
        a.created_at = from;
        b.created_at = from;

        let cards = vec![a.clone(), b.clone()];
        let reversed = vec![b.clone(), a.clone()];
        let picked = pick_effective(&cards, at(2026, 2, 1)).unwrap().id;
        let picked_reversed = pick_effective(&reversed, at(2026, 2, 1)).unwrap().id;

        // Mesma escolha independente da ordem de chegada do banco.
        assert_eq!(picked, picked_reversed);
        assert_eq!(picked, a.id.max(b.id));
    }
}
