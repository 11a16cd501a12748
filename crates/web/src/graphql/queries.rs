//! GraphQL operation definitions.
//!
//! Operations implement `graphql_client::GraphQLQuery` by hand so the
//! response types can accept the endpoint's loosely typed `rate` field.

use graphql_client::{GraphQLQuery, QueryBody};

/// Exchange rates against US dollars.
pub struct GetExchangeRates;

pub mod get_exchange_rates {
    //! Types for [`GetExchangeRates`](super::GetExchangeRates).

    use serde::{Deserialize, Deserializer, Serialize, de};

    pub const OPERATION_NAME: &str = "GetExchangeRates";

    pub const QUERY: &str = r#"query GetExchangeRates {
  rates(currency: "USD") {
    currency
    rate
    name
  }
}"#;

    /// The query takes no variables; serialized as `{}`.
    #[derive(Debug, Clone, Default, Serialize)]
    pub struct Variables {}

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    pub struct ResponseData {
        /// `null` when the endpoint has no rates for the currency.
        pub rates: Option<Vec<Option<Rate>>>,
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    pub struct Rate {
        pub currency: String,
        #[serde(deserialize_with = "number_or_numeric_string")]
        pub rate: f64,
        pub name: String,
    }

    /// The public sandbox serves rates as strings ("0.91"); other servers
    /// send JSON numbers.
    fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| de::Error::custom(format!("rate is not a number: {s:?}"))),
        }
    }
}

impl GraphQLQuery for GetExchangeRates {
    type Variables = get_exchange_rates::Variables;
    type ResponseData = get_exchange_rates::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_exchange_rates::QUERY,
            operation_name: get_exchange_rates::OPERATION_NAME,
        }
    }
}
