//! Year strategies: override, platform dates, embedded tag, a year in the
//! title.

use async_trait::async_trait;

use discoteca_core::provenance::Source;

use super::pattern::{year_from_date, year_in_text, YEAR_RANGE};
use super::{Chain, ResolveContext, Strategy};
use crate::error::EnrichResult;

/// The standard year chain.
pub fn chain() -> Chain<i32> {
    vec![
        Box::new(OverrideYear),
        Box::new(PlatformYear),
        Box::new(EmbeddedYear),
        Box::new(TitleYear),
    ]
}

#[derive(Debug)]
pub struct OverrideYear;

#[async_trait]
impl Strategy<i32> for OverrideYear {
    fn source(&self) -> Source {
        Source::User
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<i32>> {
        Ok(ctx.overrides.year)
    }
}

/// `release_year`, then `release_date`, then `upload_date`.
#[derive(Debug)]
pub struct PlatformYear;

#[async_trait]
impl Strategy<i32> for PlatformYear {
    fn source(&self) -> Source {
        Source::Platform
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<i32>> {
        let Some(info) = &ctx.info else {
            return Ok(None);
        };
        Ok(info
            .release_year
            .filter(|y| YEAR_RANGE.contains(y))
            .or_else(|| info.release_date.as_deref().and_then(year_from_date))
            .or_else(|| info.upload_date.as_deref().and_then(year_from_date)))
    }
}

#[derive(Debug)]
pub struct EmbeddedYear;

#[async_trait]
impl Strategy<i32> for EmbeddedYear {
    fn source(&self) -> Source {
        Source::EmbeddedTag
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<i32>> {
        Ok(ctx.embedded.year.filter(|y| YEAR_RANGE.contains(y)))
    }
}

#[derive(Debug)]
pub struct TitleYear;

#[async_trait]
impl Strategy<i32> for TitleYear {
    fn source(&self) -> Source {
        Source::TitlePattern
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<i32>> {
        Ok(year_in_text(&ctx.raw_title))
    }
}
