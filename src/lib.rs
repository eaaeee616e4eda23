#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate log;
extern crate nom;
extern crate serde;
extern crate serde_yaml;

pub mod ast;
pub mod cfg;
pub mod environment;
pub mod folding;
pub mod propagation;
pub mod rd;
pub mod util;

pub mod error {
    error_chain! {
        types {
            Error, ErrorKind, ResultExt, Result;
        }

        foreign_links {
            IOError(::std::io::Error);
            SerdeYAML(::serde_yaml::Error);
        }

        errors {
            Precondition(m: String) {
                description("A precondition was violated")
                display("Precondition violated: {}", m)
            }
            Parse(m: String) {
                description("Syntax error")
                display("Syntax error: {}", m)
            }
        }
    }
}
