#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate kerberos_exchange;

use kerberos_exchange::krb5_parser::{parse_authenticator, parse_service_ticket, parse_ticket_granting_ticket};

fuzz_target!(|data: &[u8]| {
    let _ = parse_ticket_granting_ticket(data);
    let _ = parse_service_ticket(data);
    let _ = parse_authenticator(data);
});
