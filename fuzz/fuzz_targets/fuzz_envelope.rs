#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate kerberos_exchange;

use kerberos_exchange::envelope::open;
use kerberos_exchange::krb5::{EncryptionKey, TicketGrantingTicket};

fuzz_target!(|data: &[u8]| {
    let key = EncryptionKey::from_bytes([7u8; 32]);
    let _ = open::<TicketGrantingTicket>(data, &key);
});
