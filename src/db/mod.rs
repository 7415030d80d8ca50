pub mod db_pool;
