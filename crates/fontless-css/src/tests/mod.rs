mod families;
mod parser;
