// src/db/quote_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::quotes::Quote};

// Leitor da tabela `quotes`, que pertence ao módulo de vendas.
// Nenhum método aqui escreve em `quotes`.
//
// Nota: usamos a API de runtime (`sqlx::query_as::<_, T>`) em vez das
// macros `query_as!` para o crate compilar sem um banco ativo.
#[derive(Clone)]
pub struct QuoteRepository;

const QUOTE_COLUMNS: &str = "id, total_amount, labour_estimate, job_id, archived_at";

impl QuoteRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get_quote<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<Option<Quote>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quote = sqlx::query_as::<_, Quote>(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = $1"
        ))
        .bind(quote_id)
        .fetch_optional(executor)
        .await?;

        Ok(quote)
    }

    /// Busca o orçamento com `FOR UPDATE`: trava a linha até o fim da
    /// transação e serializa recálculos concorrentes do mesmo orçamento.
    pub async fn get_quote_for_update<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<Option<Quote>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quote = sqlx::query_as::<_, Quote>(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = $1 FOR UPDATE"
        ))
        .bind(quote_id)
        .fetch_optional(executor)
        .await?;

        Ok(quote)
    }

    /// Jobs são criados a partir de orçamentos aceitos; o vínculo mora em
    /// `quotes.job_id`. É assim que a visão por job chega ao mesmo resumo.
    pub async fn get_quote_by_job<'e, E>(
        &self,
        executor: E,
        job_id: Uuid,
    ) -> Result<Option<Quote>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quote = sqlx::query_as::<_, Quote>(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes WHERE job_id = $1"
        ))
        .bind(job_id)
        .fetch_optional(executor)
        .await?;

        Ok(quote)
    }
}
