mod message_role_test;
