//! Handler fuer eingehende Datagramme
//!
//! Jeder Handler ist fuer eine Paketart zustaendig und arbeitet auf dem
//! `ServerZustand` des Servers. Fehler werden protokolliert, nie
//! zurueckgegeben.

pub mod channel_handler;
pub mod connection_handler;
pub mod keepalive_handler;
