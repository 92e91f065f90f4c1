use syn::parse::Parse;
use syn::{parse::ParseStream, Error, Ident, Path, Result, Token};

/// Interrupt channels known to the `lpc-vic` channel table.
const CHANNELS: [&str; 6] = ["Watchdog", "Timer0", "Timer1", "Rtc", "Eint0", "Eint2"];

pub struct IsrInput {
    /// Path to the `lpc-vic` crate.
    pub lpc_vic: Path,
    /// Function returning the register bank the handler acknowledges on.
    pub bank: Option<Path>,
    /// Channel whose pending flag is cleared on exit.
    pub channel: Option<Ident>,
}

impl Parse for IsrInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut lpc_vic = None;
        let mut bank = None;
        let mut channel: Option<Ident> = None;

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            match ident.to_string().as_str() {
                "lpc_vic" => {
                    if lpc_vic.is_some() {
                        return Err(Error::new(ident.span(), "duplicate identifier"));
                    }
                    input.parse::<Token![=]>()?; // consume the '='
                    lpc_vic = Some(input.parse()?);
                }
                "bank" => {
                    if bank.is_some() {
                        return Err(Error::new(ident.span(), "duplicate identifier"));
                    }
                    input.parse::<Token![=]>()?; // consume the '='
                    bank = Some(input.parse()?);
                }
                "channel" => {
                    if channel.is_some() {
                        return Err(Error::new(ident.span(), "duplicate identifier"));
                    }
                    input.parse::<Token![=]>()?; // consume the '='
                    let value: Ident = input.parse()?;
                    if !CHANNELS.contains(&value.to_string().as_str()) {
                        return Err(Error::new(
                            value.span(),
                            format!("unknown channel, expected one of {}", CHANNELS.join(", ")),
                        ));
                    }
                    channel = Some(value);
                }
                _ => return Err(Error::new(ident.span(), "invalid identifier")),
            }
            if !input.is_empty() {
                input.parse::<Token![,]>()?; // consume the ',' between identifiers
            }
        }

        let lpc_vic = match lpc_vic {
            Some(lpc_vic) => lpc_vic,
            None => syn::parse_quote!(::lpc_vic),
        };

        Ok(IsrInput {
            lpc_vic,
            bank,
            channel,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_uses_defaults() {
        let input: IsrInput = syn::parse_str("").unwrap();
        assert!(input.bank.is_none());
        assert!(input.channel.is_none());
        let path = &input.lpc_vic;
        assert_eq!(quote::quote!(#path).to_string(), ":: lpc_vic");
    }

    #[test]
    fn parses_all_keys() {
        let input: IsrInput =
            syn::parse_str("lpc_vic = crate::vic, bank = board::bank, channel = Timer1").unwrap();
        assert_eq!(input.channel.unwrap().to_string(), "Timer1");
        let bank = input.bank.unwrap();
        assert_eq!(quote::quote!(#bank).to_string(), "board :: bank");
    }

    #[test]
    fn rejects_duplicates() {
        let err = syn::parse_str::<IsrInput>("channel = Rtc, channel = Rtc")
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "duplicate identifier");
    }

    #[test]
    fn rejects_unknown_keys_and_channels() {
        let err = syn::parse_str::<IsrInput>("slot = 3").err().unwrap();
        assert_eq!(err.to_string(), "invalid identifier");

        let err = syn::parse_str::<IsrInput>("channel = Uart0").err().unwrap();
        assert!(err.to_string().starts_with("unknown channel"));
    }
}
