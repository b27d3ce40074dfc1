use crate::models::{DateWindow, DimensionId, SortOrder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field the date window is applied to
pub const DATE_FIELD: &str = "segments.date";
/// Field the campaign restriction is applied to
pub const CAMPAIGN_ID_FIELD: &str = "campaign.id";

/// Provider resource a query reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Customer,
    Campaign,
    AdGroup,
    AdGroupAd,
    KeywordView,
}

impl Resource {
    /// Broad resource used when the dimension does not name one
    pub const DEFAULT: Resource = Resource::Campaign;

    /// Infer the resource from the dimension's namespace prefix
    pub fn for_dimension(dimension: Option<&DimensionId>) -> Self {
        match dimension.and_then(DimensionId::namespace) {
            Some("customer") => Self::Customer,
            Some("campaign") => Self::Campaign,
            Some("ad_group") => Self::AdGroup,
            Some("ad_group_ad") => Self::AdGroupAd,
            Some("ad_group_criterion") | Some("keyword") => Self::KeywordView,
            _ => Self::DEFAULT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Campaign => "campaign",
            Self::AdGroup => "ad_group",
            Self::AdGroupAd => "ad_group_ad",
            Self::KeywordView => "keyword_view",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date range plus optional campaign inclusion.
///
/// `campaign_ids` is `None` when unrestricted and never `Some` of an empty
/// list, which would exclude every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub window: DateWindow,
    pub campaign_ids: Option<Vec<String>>,
}

impl QueryFilter {
    pub fn new<I, S>(window: DateWindow, campaign_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let campaign_ids: Vec<String> = campaign_ids.into_iter().map(Into::into).collect();
        Self {
            window,
            campaign_ids: (!campaign_ids.is_empty()).then_some(campaign_ids),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderClause {
    pub field: String,
    pub direction: SortOrder,
}

/// Provider-neutral description of one fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Deduplicated fields, dimension first
    pub projection: Vec<String>,
    pub resource: Resource,
    pub filter: QueryFilter,
    pub order: Option<OrderClause>,
    pub limit: u32,
}

impl QueryDescriptor {
    /// Render the provider query text
    pub fn render(&self) -> String {
        let mut query = format!(
            "SELECT {} FROM {} WHERE {} BETWEEN '{}' AND '{}'",
            self.projection.join(", "),
            self.resource,
            DATE_FIELD,
            self.filter.window.start.format("%Y-%m-%d"),
            self.filter.window.end.format("%Y-%m-%d"),
        );

        if let Some(campaign_ids) = &self.filter.campaign_ids {
            let values: Vec<String> = campaign_ids.iter().map(|id| render_literal(id)).collect();
            query.push_str(&format!(" AND {CAMPAIGN_ID_FIELD} IN ({})", values.join(", ")));
        }

        if let Some(order) = &self.order {
            query.push_str(&format!(" ORDER BY {} {}", order.field, order.direction));
        }

        query.push_str(&format!(" LIMIT {}", self.limit));
        query
    }
}

fn render_literal(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "\\'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        )
    }

    #[test]
    fn test_resource_inference() {
        let dim = |id: &str| DimensionId::from(id);
        assert_eq!(Resource::for_dimension(None), Resource::Campaign);
        assert_eq!(
            Resource::for_dimension(Some(&dim("ad_group.name"))),
            Resource::AdGroup
        );
        assert_eq!(
            Resource::for_dimension(Some(&dim("ad_group_criterion.keyword.text"))),
            Resource::KeywordView
        );
        assert_eq!(
            Resource::for_dimension(Some(&dim("segments.date"))),
            Resource::Campaign
        );
        assert_eq!(
            Resource::for_dimension(Some(&dim("unknown.field"))),
            Resource::Campaign
        );
    }

    #[test]
    fn test_empty_campaign_list_is_unrestricted() {
        let filter = QueryFilter::new(window(), Vec::<String>::new());
        assert!(filter.campaign_ids.is_none());
    }

    #[test]
    fn test_render_full_query() {
        let descriptor = QueryDescriptor {
            projection: vec!["campaign.name".into(), "metrics.clicks".into()],
            resource: Resource::Campaign,
            filter: QueryFilter::new(window(), ["1", "2"]),
            order: Some(OrderClause {
                field: "metrics.clicks".into(),
                direction: SortOrder::Desc,
            }),
            limit: 10,
        };
        assert_eq!(
            descriptor.render(),
            "SELECT campaign.name, metrics.clicks FROM campaign \
             WHERE segments.date BETWEEN '2024-03-01' AND '2024-03-10' \
             AND campaign.id IN (1, 2) ORDER BY metrics.clicks DESC LIMIT 10"
        );
    }

    #[test]
    fn test_render_quotes_non_numeric_ids() {
        assert_eq!(render_literal("123"), "123");
        assert_eq!(render_literal("o'brien"), "'o\\'brien'");
    }
}
