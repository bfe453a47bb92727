//! Static broker directory and resolver.
//!
//! Lookups never miss: an unknown or absent id resolves to the designated
//! default broker so downstream placeholder substitution always has a value.

/// Contact record for one broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerRecord {
    pub id: &'static str,
    pub name: &'static str,
    pub phone: &'static str,
    pub email: &'static str,
}

/// Id of the broker used when a lookup misses
pub const DEFAULT_BROKER_ID: &str = "alex-krause";

// Asset convention:
// assets/brokers/<id>/broker-photo.png
// assets/brokers/<id>/broker-phone.png
const BROKERS: &[BrokerRecord] = &[
    BrokerRecord { id: "alex-krause", name: "Alex Krause", phone: "078 549 2029", email: "alex@auctioninc.co.za" },
    BrokerRecord { id: "gary-brower", name: "Gary Brower", phone: "082 352 5552", email: "garyb@auctioninc.co.za" },
    BrokerRecord { id: "bongane-khumalo", name: "Bongane Khumalo", phone: "073 785 5100", email: "bongane@auctioninc.co.za" },
    BrokerRecord { id: "cliff-matshatsha", name: "Cliff Matshatsha", phone: "082 099 8692", email: "cliff@auctioninc.co.za" },
    BrokerRecord { id: "daniel-wachenheimer", name: "Daniel Wachenheimer", phone: "082 740 2856", email: "daniel@auctioninc.co.za" },
    BrokerRecord { id: "dean-doucha", name: "Dean Doucha", phone: "082 374 5565", email: "dean@auctioninc.co.za" },
    BrokerRecord { id: "elki-medalie", name: "Elki Medalie", phone: "083 764 5370", email: "elki@auctioninc.co.za" },
    BrokerRecord { id: "doron-sacks", name: "Doron Sacks", phone: "082 550 7081", email: "doron@auctioninc.co.za" },
    BrokerRecord { id: "george-merricks", name: "George Merricks", phone: "082 859 9303", email: "george@auctioninc.co.za" },
    BrokerRecord { id: "gerhard-venter", name: "Gerhard Venter", phone: "076 905 5519", email: "gerhard@auctioninc.co.za" },
    BrokerRecord { id: "jenny-pillay", name: "Jenny Pillay", phone: "063 959 2260", email: "jenny@auctioninc.co.za" },
    BrokerRecord { id: "jessica-beyers-lahner", name: "Jessica Beyers-Lahner", phone: "072 576 0973", email: "jessica@auctioninc.co.za" },
    BrokerRecord { id: "jodi-bedil", name: "Jodi Bedil", phone: "076 637 1273", email: "jodib@auctioninc.co.za" },
    BrokerRecord { id: "jodi-frankel", name: "Jodi Frankel", phone: "082 441 8409", email: "jodif@auctioninc.co.za" },
    BrokerRecord { id: "keith-nkosi", name: "Keith Nkosi", phone: "081 828 1817", email: "keith@auctioninc.co.za" },
    BrokerRecord { id: "luanda-tlhotlhalemaje", name: "Luanda Tlhotlhalemaje", phone: "071 904 4061", email: "luanda@skyriseproperties.co.za" },
    BrokerRecord { id: "nic-brett", name: "Nic Brett", phone: "078 330 7523", email: "nic@auctioninc.co.za" },
    BrokerRecord { id: "reece-louw", name: "Reece Louw", phone: "076 393 1131", email: "reece@auctioninc.co.za" },
    BrokerRecord { id: "reshma-sookran", name: "Reshma Sookran", phone: "071 876 6524", email: "reshma@auctioninc.co.za" },
    BrokerRecord { id: "shlomo-hecht", name: "Shlomo Hecht", phone: "073 791 7967", email: "shlomo@auctioninc.co.za" },
    BrokerRecord { id: "sim-mthembu", name: "Sim Mthembu", phone: "063 829 7431", email: "simphiwe@auctioninc.co.za" },
    BrokerRecord { id: "stuart-holliman", name: "Stuart Holliman", phone: "067 373 9239", email: "stuart@auctioninc.co.za" },
    BrokerRecord { id: "thabani-ncube", name: "Thabani Ncube", phone: "071 624 2899", email: "thabani@auctioninc.co.za" },
    BrokerRecord { id: "yoni-dadon", name: "Yoni Dadon", phone: "061 822 6128", email: "yoni@auctioninc.co.za" },
];

/// Resolve a broker id to its record, falling back to the default broker
/// when the id is absent or unknown.
pub fn resolve(id: Option<&str>) -> &'static BrokerRecord {
    let wanted = id.filter(|s| !s.is_empty()).unwrap_or(DEFAULT_BROKER_ID);
    BROKERS
        .iter()
        .find(|b| b.id == wanted)
        .unwrap_or_else(|| default_broker())
}

/// The designated default broker record
pub fn default_broker() -> &'static BrokerRecord {
    BROKERS
        .iter()
        .find(|b| b.id == DEFAULT_BROKER_ID)
        .unwrap_or(&BROKERS[0])
}

/// Per-broker asset path (e.g. `broker-photo.png`) under the directory convention
pub fn broker_asset_path(broker_id: &str, asset_name: &str) -> String {
    format!("assets/brokers/{}/{}", broker_id, asset_name)
}

/// Site-wide fallback path used when a per-broker asset fails to load
pub fn fallback_asset_path(asset_name: &str) -> String {
    format!("assets/{}", asset_name)
}
