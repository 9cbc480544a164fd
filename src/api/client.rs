use chrono::NaiveDate;
use reqwest::Method;
use reqwest::blocking::Client as ReqwestClient;
use reqwest::header::CONTENT_TYPE;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::api::cache::{CacheKey, ResultCache};
use crate::api::policy::{self, NonceSource};
use crate::api::types::{
    CreateOrderParams, DEFAULT_TRADES_LIMIT, DateRangeParams, FeeParams, MarketId, MarketParams,
    MyTradesParams, OrderId, OrderParams, OrderType, WithdrawalParams, is_pair,
};
use crate::api::Config;
use crate::auth::{self, Credentials};
use crate::error::Error;
use crate::{DEFAULT_HOST, Result};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Blocking client for the private trading API.
///
/// Every method takes `&mut self`: the client owns its nonce counter and result cache
/// and provides no internal synchronization. Share it across threads only behind a
/// caller-held lock, or give each worker its own client.
///
/// Read operations take an optional `cached` override of [`Config::caching`]; write
/// operations take an optional `simulated` override of [`Config::simulation`].
#[derive(Debug)]
pub struct Client {
    transport: Transport,
    config: Config,
    cache: ResultCache,
}

/// Everything needed to put one signed request on the wire.
#[derive(Debug)]
struct Transport {
    host: Url,
    credentials: Credentials,
    nonce: NonceSource,
    client: ReqwestClient,
}

impl Transport {
    fn call<P: Serialize + ?Sized>(&mut self, method: &str, params: &P) -> Result<Value> {
        let mut body = serde_html_form::to_string([("method", method)])?;
        let encoded = serde_html_form::to_string(params)?;
        if !encoded.is_empty() {
            body.push('&');
            body.push_str(&encoded);
        }

        let mut request = self
            .client
            .request(Method::POST, self.host.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .build()?;
        auth::sign(&self.credentials, &mut request, self.nonce.next())?;

        #[cfg(feature = "tracing")]
        tracing::debug!(method, host = %self.host, "sending request");

        crate::request(&self.client, request)
    }
}

impl Client {
    /// Creates a client for the production endpoint, [`DEFAULT_HOST`].
    pub fn new(credentials: Credentials, config: Config) -> Result<Self> {
        Self::with_host(DEFAULT_HOST, credentials, config)
    }

    pub fn with_host(host: &str, credentials: Credentials, config: Config) -> Result<Self> {
        Self::with_host_and_client(host, credentials, config, ReqwestClient::new())
    }

    /// Creates a client with a caller-built HTTP client.
    ///
    /// No timeout is applied by default; configure one on `client` if needed.
    pub fn with_host_and_client(
        host: &str,
        credentials: Credentials,
        config: Config,
        client: ReqwestClient,
    ) -> Result<Self> {
        let host = Url::parse(host)?;

        Ok(Self {
            transport: Transport {
                host,
                credentials,
                nonce: NonceSource::new(config.nonce()),
                client,
            },
            config,
            cache: ResultCache::default(),
        })
    }

    #[must_use]
    pub fn host(&self) -> &Url {
        &self.transport.host
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.transport.credentials
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of distinct read results currently memoized.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drops every memoized read result. The client never does this on its own.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Signs and sends `method` with `params`, returning the decoded JSON body as-is.
    ///
    /// `params` must serialize as a struct, a map or a sequence of pairs; use `&()` for
    /// none. This bypasses both the cache and simulation mode.
    pub fn call<P: Serialize + ?Sized>(&mut self, method: &str, params: &P) -> Result<Value> {
        self.transport.call(method, params)
    }

    fn read<P: Serialize + ?Sized>(
        &mut self,
        method: &'static str,
        params: &P,
        cached: Option<bool>,
    ) -> Result<Value> {
        let cached = policy::resolve(cached, self.config.caching());
        let key = CacheKey::new(method, params)?;
        let transport = &mut self.transport;

        self.cache
            .get_or_refresh(key, cached, || transport.call(method, params))
    }

    fn write<P: Serialize + ?Sized>(
        &mut self,
        method: &'static str,
        params: &P,
        simulated: Option<bool>,
    ) -> Result<Option<Value>> {
        if policy::resolve(simulated, self.config.simulation()) {
            #[cfg(feature = "tracing")]
            tracing::info!(method, "simulation mode, request not sent");

            return Ok(None);
        }

        self.transport.call(method, params).map(Some)
    }

    /// Account balances, open order count and server time.
    pub fn getinfo(&mut self, cached: Option<bool>) -> Result<Value> {
        self.read("getinfo", &(), cached)
    }

    /// Every market with its currency codes, last trade and volume.
    pub fn getmarkets(&mut self, cached: Option<bool>) -> Result<Value> {
        self.read("getmarkets", &(), cached)
    }

    pub fn getcoindata(&mut self, cached: Option<bool>) -> Result<Value> {
        self.read("getcoindata", &(), cached)
    }

    pub fn getwalletstatus(&mut self, cached: Option<bool>) -> Result<Value> {
        self.read("getwalletstatus", &(), cached)
    }

    /// Deposits and withdrawals on the account.
    pub fn mytransactions(&mut self, cached: Option<bool>) -> Result<Value> {
        self.read("mytransactions", &(), cached)
    }

    /// Most recent trades in a market, from all users.
    pub fn markettrades<M: Into<MarketId>>(
        &mut self,
        marketid: M,
        cached: Option<bool>,
    ) -> Result<Value> {
        let marketid = marketid.into();
        self.read("markettrades", &MarketParams { marketid: &marketid }, cached)
    }

    /// Open buy and sell orders in a market, from all users.
    pub fn marketorders<M: Into<MarketId>>(
        &mut self,
        marketid: M,
        cached: Option<bool>,
    ) -> Result<Value> {
        let marketid = marketid.into();
        self.read("marketorders", &MarketParams { marketid: &marketid }, cached)
    }

    /// The account's trades in a market, at most `limit` (default 200).
    pub fn mytrades<M: Into<MarketId>>(
        &mut self,
        marketid: M,
        limit: Option<u32>,
        cached: Option<bool>,
    ) -> Result<Value> {
        let marketid = marketid.into();
        let params = MyTradesParams {
            marketid: &marketid,
            limit: limit.unwrap_or(DEFAULT_TRADES_LIMIT),
        };
        self.read("mytrades", &params, cached)
    }

    /// The account's trades across all markets, optionally bounded by date.
    pub fn allmytrades(
        &mut self,
        startdate: Option<NaiveDate>,
        enddate: Option<NaiveDate>,
        cached: Option<bool>,
    ) -> Result<Value> {
        let params = DateRangeParams { startdate, enddate };
        self.read("allmytrades", &params, cached)
    }

    pub fn myorders<M: Into<MarketId>>(
        &mut self,
        marketid: M,
        cached: Option<bool>,
    ) -> Result<Value> {
        let marketid = marketid.into();
        self.read("myorders", &MarketParams { marketid: &marketid }, cached)
    }

    /// Order book of a market.
    pub fn depth<M: Into<MarketId>>(&mut self, marketid: M, cached: Option<bool>) -> Result<Value> {
        let marketid = marketid.into();
        self.read("depth", &MarketParams { marketid: &marketid }, cached)
    }

    pub fn allmyorders(&mut self, cached: Option<bool>) -> Result<Value> {
        self.read("allmyorders", &(), cached)
    }

    pub fn mytransfers(&mut self, cached: Option<bool>) -> Result<Value> {
        self.read("mytransfers", &(), cached)
    }

    pub fn getmydepositaddresses(&mut self, cached: Option<bool>) -> Result<Value> {
        self.read("getmydepositaddresses", &(), cached)
    }

    pub fn getorderstatus<O: Into<OrderId>>(
        &mut self,
        orderid: O,
        cached: Option<bool>,
    ) -> Result<Value> {
        let orderid = orderid.into();
        self.read("getorderstatus", &OrderParams { orderid: &orderid }, cached)
    }

    /// Places a limit order. Returns `Ok(None)` without sending anything in simulation
    /// mode.
    pub fn createorder<M: Into<MarketId>>(
        &mut self,
        marketid: M,
        ordertype: OrderType,
        quantity: Decimal,
        price: Decimal,
        simulated: Option<bool>,
    ) -> Result<Option<Value>> {
        let marketid = marketid.into();
        let params = CreateOrderParams {
            marketid: &marketid,
            ordertype,
            quantity,
            price,
        };
        self.write("createorder", &params, simulated)
    }

    pub fn cancelorder<O: Into<OrderId>>(
        &mut self,
        orderid: O,
        simulated: Option<bool>,
    ) -> Result<Option<Value>> {
        let orderid = orderid.into();
        self.write("cancelorder", &OrderParams { orderid: &orderid }, simulated)
    }

    pub fn cancelmarketorders<M: Into<MarketId>>(
        &mut self,
        marketid: M,
        simulated: Option<bool>,
    ) -> Result<Option<Value>> {
        let marketid = marketid.into();
        self.write(
            "cancelmarketorders",
            &MarketParams { marketid: &marketid },
            simulated,
        )
    }

    pub fn cancelallorders(&mut self, simulated: Option<bool>) -> Result<Option<Value>> {
        self.write("cancelallorders", &(), simulated)
    }

    /// Fee and net total the exchange would charge for an order. Treated as a write, so
    /// it is suppressed in simulation mode like the others.
    pub fn calculatefees(
        &mut self,
        ordertype: OrderType,
        quantity: Decimal,
        price: Decimal,
        simulated: Option<bool>,
    ) -> Result<Option<Value>> {
        let params = FeeParams {
            ordertype,
            quantity,
            price,
        };
        self.write("calculatefees", &params, simulated)
    }

    pub fn makewithdrawal(
        &mut self,
        address: &str,
        amount: Decimal,
        simulated: Option<bool>,
    ) -> Result<Option<Value>> {
        let params = WithdrawalParams { address, amount };
        self.write("makewithdrawal", &params, simulated)
    }

    /// Not supported by this client; always fails with [`Kind::Unsupported`].
    ///
    /// [`Kind::Unsupported`]: crate::error::Kind::Unsupported
    pub fn generatenewaddress(
        &mut self,
        _currencyid: Option<&str>,
        _currencycode: Option<&str>,
    ) -> Result<Value> {
        Err(Error::unsupported("generatenewaddress"))
    }

    /// Finds the market trading `primary` against `secondary` in [`Client::getmarkets`],
    /// which follows the client's default caching.
    ///
    /// The first match in the exchange's ordering wins. `Ok(None)` means no market
    /// matches.
    pub fn getmarket(&mut self, primary: &str, secondary: &str) -> Result<Option<Value>> {
        let markets = self.getmarkets(None)?;
        let list = markets
            .get("return")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::validation("getmarkets response has no `return` array"))?;

        Ok(list
            .iter()
            .find(|market| is_pair(market, primary, secondary))
            .cloned())
    }

    pub fn order_buy(
        &mut self,
        primary: &str,
        secondary: &str,
        quantity: Decimal,
        price: Decimal,
        simulated: Option<bool>,
    ) -> Result<Option<Value>> {
        self.order(primary, secondary, OrderType::Buy, quantity, price, simulated)
    }

    pub fn order_sell(
        &mut self,
        primary: &str,
        secondary: &str,
        quantity: Decimal,
        price: Decimal,
        simulated: Option<bool>,
    ) -> Result<Option<Value>> {
        self.order(primary, secondary, OrderType::Sell, quantity, price, simulated)
    }

    fn order(
        &mut self,
        primary: &str,
        secondary: &str,
        ordertype: OrderType,
        quantity: Decimal,
        price: Decimal,
        simulated: Option<bool>,
    ) -> Result<Option<Value>> {
        let market = self
            .getmarket(primary, secondary)?
            .ok_or_else(|| Error::market_not_found(primary, secondary))?;
        let marketid = market
            .get("marketid")
            .and_then(MarketId::from_json)
            .ok_or_else(|| {
                Error::validation(format!("market {primary}/{secondary} has no marketid"))
            })?;

        self.createorder(marketid, ordertype, quantity, price, simulated)
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::error::Kind;

    fn client(config: Config) -> Client {
        let credentials = Credentials::new("key", SecretString::from("secret"));
        Client::new(credentials, config).expect("client")
    }

    #[test]
    fn new_should_target_default_host() {
        let client = client(Config::default());

        assert_eq!(client.host().as_str(), DEFAULT_HOST);
        assert_eq!(client.credentials().key(), "key");
        assert_eq!(client.cache_len(), 0);
    }

    #[test]
    fn invalid_host_should_fail_validation() {
        let credentials = Credentials::new("key", SecretString::from("secret"));

        let err = Client::with_host("not a url", credentials, Config::default()).unwrap_err();

        assert_eq!(err.kind(), Kind::Validation);
    }

    #[test]
    fn simulated_writes_should_not_send() -> Result<()> {
        // The default host is never contacted: every write below is suppressed.
        let mut client = client(Config::builder().simulation(true).build());

        assert!(client.cancelallorders(None)?.is_none());
        assert!(client.cancelorder(9_u64, None)?.is_none());
        assert!(client.cancelmarketorders(3_u64, None)?.is_none());
        assert!(client.makewithdrawal("addr", Decimal::ONE, None)?.is_none());
        assert!(
            client
                .calculatefees(OrderType::Buy, Decimal::ONE, Decimal::ONE, None)?
                .is_none()
        );
        assert!(
            client
                .createorder(3_u64, OrderType::Sell, Decimal::ONE, Decimal::ONE, Some(true))?
                .is_none()
        );
        Ok(())
    }

    #[test]
    fn generatenewaddress_should_be_unsupported() {
        let mut client = client(Config::default());

        let err = client.generatenewaddress(None, Some("BTC")).unwrap_err();

        assert_eq!(err.kind(), Kind::Unsupported);
    }
}
