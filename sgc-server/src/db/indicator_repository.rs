use super::rows::{convert_all, HistoryRow, IndicatorRow};
use super::{ensure_affected, query_error, PgQualityStore};
use async_trait::async_trait;
use quality_service::*;
use sqlx::{Postgres, Transaction};

const INDICATOR_COLUMNS: &str = "id, name, process_id, process, objective, target_value, \
     current_value, unit, input_1, input_2, formula, calculation_info, frequency, responsible, \
     status, trend, last_period_value, period_start_date, last_update, created_at";

const HISTORY_COLUMNS: &str =
    "id, indicator_id, value_1, value_2, result, period_date, observations, created_at";

/// Overwrite every editable column; `None` when the row is gone
async fn save_in(
    tx: &mut Transaction<'static, Postgres>,
    indicator: &Indicator,
) -> QualityResult<Option<IndicatorRow>> {
    sqlx::query_as::<_, IndicatorRow>(&format!(
        "UPDATE indicators SET name = $2, process_id = $3, process = $4, objective = $5, \
         target_value = $6, current_value = $7, unit = $8, input_1 = $9, input_2 = $10, \
         formula = $11, calculation_info = $12, frequency = $13, responsible = $14, \
         status = $15, trend = $16, last_period_value = $17, period_start_date = $18, \
         last_update = $19 WHERE id = $1 RETURNING {INDICATOR_COLUMNS}"
    ))
    .bind(indicator.id)
    .bind(&indicator.name)
    .bind(indicator.process_id)
    .bind(&indicator.process)
    .bind(&indicator.objective)
    .bind(indicator.target_value)
    .bind(indicator.current_value)
    .bind(&indicator.unit)
    .bind(&indicator.input_1)
    .bind(&indicator.input_2)
    .bind(&indicator.formula)
    .bind(&indicator.calculation_info)
    .bind(indicator.frequency.as_str())
    .bind(&indicator.responsible)
    .bind(indicator.status.as_str())
    .bind(indicator.trend.as_str())
    .bind(indicator.last_period_value)
    .bind(indicator.period_start_date)
    .bind(indicator.last_update)
    .fetch_optional(&mut **tx)
    .await
    .map_err(query_error)
}

#[async_trait]
impl IndicatorStore for PgQualityStore {
    async fn list_indicators(&self) -> QualityResult<Vec<Indicator>> {
        let rows = sqlx::query_as::<_, IndicatorRow>(&format!(
            "SELECT {INDICATOR_COLUMNS} FROM indicators ORDER BY id"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(query_error)?;
        convert_all(rows)
    }

    async fn get_indicator(&self, id: i64) -> QualityResult<Option<Indicator>> {
        sqlx::query_as::<_, IndicatorRow>(&format!(
            "SELECT {INDICATOR_COLUMNS} FROM indicators WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(query_error)?
        .map(Indicator::try_from)
        .transpose()
    }

    async fn insert_indicator(&self, indicator: Indicator) -> QualityResult<Indicator> {
        sqlx::query_as::<_, IndicatorRow>(&format!(
            "INSERT INTO indicators (name, process_id, process, objective, target_value, \
             current_value, unit, input_1, input_2, formula, calculation_info, frequency, \
             responsible, status, trend, last_period_value, period_start_date, last_update) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
             RETURNING {INDICATOR_COLUMNS}"
        ))
        .bind(&indicator.name)
        .bind(indicator.process_id)
        .bind(&indicator.process)
        .bind(&indicator.objective)
        .bind(indicator.target_value)
        .bind(indicator.current_value)
        .bind(&indicator.unit)
        .bind(&indicator.input_1)
        .bind(&indicator.input_2)
        .bind(&indicator.formula)
        .bind(&indicator.calculation_info)
        .bind(indicator.frequency.as_str())
        .bind(&indicator.responsible)
        .bind(indicator.status.as_str())
        .bind(indicator.trend.as_str())
        .bind(indicator.last_period_value)
        .bind(indicator.period_start_date)
        .bind(indicator.last_update)
        .fetch_one(self.pool())
        .await
        .map_err(query_error)?
        .try_into()
    }

    async fn save_indicator(&self, indicator: Indicator) -> QualityResult<Indicator> {
        let mut tx = self.pool().begin().await.map_err(query_error)?;
        let row = save_in(&mut tx, &indicator)
            .await?
            .ok_or_else(|| QualityError::not_found("Indicador no encontrado"))?;
        tx.commit().await.map_err(query_error)?;
        row.try_into()
    }

    async fn delete_indicator(&self, id: i64) -> QualityResult<()> {
        let result = sqlx::query("DELETE FROM indicators WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(query_error)?;
        ensure_affected(result.rows_affected(), "Indicador no encontrado")
    }

    async fn record_measurement(
        &self,
        indicator: Indicator,
        history: NewIndicatorHistory,
    ) -> QualityResult<(Indicator, IndicatorHistory)> {
        let mut tx = self.pool().begin().await.map_err(query_error)?;

        let saved = save_in(&mut tx, &indicator)
            .await?
            .ok_or_else(|| QualityError::not_found("Indicador no encontrado"))?;

        let row = sqlx::query_as::<_, HistoryRow>(&format!(
            "INSERT INTO indicator_history (indicator_id, value_1, value_2, result, period_date, observations) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {HISTORY_COLUMNS}"
        ))
        .bind(history.indicator_id)
        .bind(history.value_1)
        .bind(history.value_2)
        .bind(history.result)
        .bind(history.period_date)
        .bind(&history.observations)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok((saved.try_into()?, row.into()))
    }

    async fn list_history(&self, indicator_id: i64) -> QualityResult<Vec<IndicatorHistory>> {
        let rows = sqlx::query_as::<_, HistoryRow>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM indicator_history \
             WHERE indicator_id = $1 ORDER BY period_date DESC, id DESC"
        ))
        .bind(indicator_id)
        .fetch_all(self.pool())
        .await
        .map_err(query_error)?;
        Ok(rows.into_iter().map(IndicatorHistory::from).collect())
    }
}
