pub mod doc;
pub mod init;
pub mod login;
pub mod logout;
pub mod passwd;
pub mod whoami;

pub use doc::Doc;
pub use init::Init;
pub use login::Login;
pub use logout::Logout;
pub use passwd::Passwd;
pub use whoami::Whoami;
